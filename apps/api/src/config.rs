//! API server configuration

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use raindrops_shared_config::{
    CommonConfig, DatabaseConfig, Environment, RedisConfig, StorageConfig,
};

/// Minimum required length for JWT_SECRET to be considered secure
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the worker
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// JWT secret for authentication
    pub jwt_secret: String,

    /// JWT access token expiry (default: 15m)
    pub jwt_access_expiry: String,

    /// JWT refresh token expiry (default: 7d)
    pub jwt_refresh_expiry: String,

    /// Shared secret expected from the streaming server's webhook
    pub webhook_token: String,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode, this function requires:
    /// - `JWT_SECRET`: Must be set and at least 32 characters long
    /// - `WEBHOOK_TOKEN`: Must be explicitly set (no insecure defaults)
    /// - `DATABASE_URL`: Must be explicitly set (no insecure defaults)
    ///
    /// In development/staging mode, sensible defaults are used for convenience.
    pub fn from_env() -> Result<Self> {
        // Determine environment first to know if we need strict validation
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();
        let is_production = environment.is_production();

        let jwt_secret = Self::load_jwt_secret(is_production)?;
        let webhook_token = Self::load_webhook_token(is_production)?;

        if is_production {
            Self::validate_database_url()?;
        }

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT value")?,

            jwt_secret,

            jwt_access_expiry: env::var("JWT_ACCESS_EXPIRY").unwrap_or_else(|_| "15m".to_string()),

            jwt_refresh_expiry: env::var("JWT_REFRESH_EXPIRY").unwrap_or_else(|_| "7d".to_string()),

            webhook_token,

            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        })
    }

    /// Load and validate JWT_SECRET
    ///
    /// In production:
    /// - JWT_SECRET must be explicitly set
    /// - Must be at least MIN_JWT_SECRET_LENGTH characters
    ///
    /// In development: uses a default value with a warning
    fn load_jwt_secret(is_production: bool) -> Result<String> {
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                if is_production && secret.len() < MIN_JWT_SECRET_LENGTH {
                    bail!(
                        "JWT_SECRET must be at least {} characters in production (got {})",
                        MIN_JWT_SECRET_LENGTH,
                        secret.len()
                    );
                }
                Ok(secret)
            }
            _ if is_production => {
                bail!(
                    "JWT_SECRET environment variable is required in production. \
                     Please set a secure secret of at least {} characters.",
                    MIN_JWT_SECRET_LENGTH
                );
            }
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set, using insecure default. \
                     This is only acceptable in development mode."
                );
                Ok("development-secret-change-in-production".to_string())
            }
        }
    }

    /// Load and validate WEBHOOK_TOKEN
    ///
    /// In production: WEBHOOK_TOKEN must be explicitly set
    /// In development: uses a default value
    fn load_webhook_token(is_production: bool) -> Result<String> {
        match env::var("WEBHOOK_TOKEN") {
            Ok(token) if !token.is_empty() => Ok(token),
            _ if is_production => {
                bail!(
                    "WEBHOOK_TOKEN environment variable is required in production. \
                     Please set the shared secret configured on the streaming server."
                );
            }
            _ => {
                tracing::warn!(
                    "WEBHOOK_TOKEN not set, using insecure default. \
                     This is only acceptable in development mode."
                );
                Ok("development-webhook-token".to_string())
            }
        }
    }

    /// Validate that DATABASE_URL is explicitly set in production
    fn validate_database_url() -> Result<()> {
        match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(()),
            _ => {
                bail!(
                    "DATABASE_URL environment variable is required in production. \
                     Please set your PostgreSQL connection string."
                );
            }
        }
    }

    // Convenience accessors for common config fields

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get Redis configuration
    pub fn redis(&self) -> &RedisConfig {
        &self.common.redis
    }

    /// Get object storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.common.storage
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
