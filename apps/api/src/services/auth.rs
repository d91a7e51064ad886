//! Authentication service
//!
//! This module provides the account and session functionality:
//! - Profile registration with Argon2id password hashing
//! - Login with JWT access/refresh token generation
//! - Token refresh and verification
//! - Session management and logout

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{AuthTokens, Claims, Profile, RefreshClaims};
use crate::repositories::SessionRepository;

/// Authentication service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token TTL in seconds (default: 15 minutes)
    pub access_token_ttl_secs: i64,
    /// Refresh token TTL in seconds (default: 7 days)
    pub refresh_token_ttl_secs: i64,
    /// JWT issuer
    pub issuer: String,
    /// JWT audience
    pub audience: String,
}

impl AuthConfig {
    /// Create a new AuthConfig with default TTLs
    pub fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 3600,
            issuer: "raindrops".to_string(),
            audience: "raindrops".to_string(),
        }
    }

    /// Create AuthConfig from expiry strings (e.g., "15m", "7d")
    pub fn with_expiry_strings(
        jwt_secret: String,
        access_expiry: &str,
        refresh_expiry: &str,
    ) -> Self {
        Self {
            jwt_secret,
            access_token_ttl_secs: parse_duration_string(access_expiry).unwrap_or(15 * 60),
            refresh_token_ttl_secs: parse_duration_string(refresh_expiry).unwrap_or(7 * 24 * 3600),
            issuer: "raindrops".to_string(),
            audience: "raindrops".to_string(),
        }
    }
}

/// Parse duration strings like "15m", "7d", "24h" to seconds
fn parse_duration_string(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: i64 = num_str.parse().ok()?;

    match unit {
        "s" => Some(num),
        "m" => Some(num * 60),
        "h" => Some(num * 3600),
        "d" => Some(num * 24 * 3600),
        "w" => Some(num * 7 * 24 * 3600),
        _ => None,
    }
}

/// Columns selected when the auth flow loads a profile
const PROFILE_COLUMNS: &str = "id, username, email, password_hash, is_godmode, \
     is_authorized, last_seen_at, created_at, updated_at";

/// Authentication service providing registration, login, and token management
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    sessions: SessionRepository,
    config: AuthConfig,
    argon2: Argon2<'static>,
    /// Pre-computed dummy hash for timing attack prevention.
    /// We verify against this hash when a profile is not found to ensure
    /// consistent response times regardless of whether the email exists.
    dummy_password_hash: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        let argon2 = Argon2::default();

        let dummy_salt = SaltString::generate(&mut OsRng);
        let dummy_password_hash = argon2
            .hash_password(b"dummy_password_for_timing_attack_prevention", &dummy_salt)
            .expect("dummy password hashing should not fail")
            .to_string();

        Self {
            sessions: SessionRepository::new(pool.clone()),
            pool,
            config,
            argon2,
            dummy_password_hash,
        }
    }

    /// Register a new profile
    ///
    /// The very first profile on a fresh database receives the godmode
    /// and authorized flags, so an installation always has one account
    /// able to administer the rest.
    ///
    /// # Errors
    /// - `ApiError::Conflict` if the email or username already exists
    /// - `ApiError::ValidationError` if any field is invalid
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<Profile> {
        if !is_valid_email(email) {
            return Err(ApiError::ValidationError(
                "invalid email format".to_string(),
            ));
        }

        let username = username.trim();
        if username.len() < 3 || username.len() > 32 {
            return Err(ApiError::ValidationError(
                "username must be 3-32 characters".to_string(),
            ));
        }

        if password.len() < 8 {
            return Err(ApiError::ValidationError(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = self.hash_password(password)?;

        // First account bootstrap: grant full privileges
        let existing_profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        let is_first = existing_profiles == 0;

        let sql = format!(
            r#"
            INSERT INTO profiles (username, email, password_hash, is_godmode, is_authorized)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let profile: Profile = sqlx::query_as(&sql)
            .bind(username)
            .bind(email.to_lowercase())
            .bind(&password_hash)
            .bind(is_first)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    ApiError::Conflict {
                        resource_type: "profile",
                        id: email.to_string(),
                    }
                }
                _ => ApiError::Database(e),
            })?;

        tracing::info!(
            profile_id = %profile.id,
            username = %profile.username,
            bootstrap = is_first,
            "Profile registered successfully"
        );

        Ok(profile)
    }

    /// Register and immediately open a session
    ///
    /// Skips the separate login round-trip (and its Argon2 verification)
    /// right after the password was hashed.
    pub async fn register_with_session(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<(Profile, AuthTokens)> {
        let profile = self.register(email, username, password).await?;
        let tokens = self.create_session(&profile).await?;
        Ok((profile, tokens))
    }

    /// Authenticate a profile and create a new session
    ///
    /// # Errors
    /// - `ApiError::Unauthorized` if credentials are invalid
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(Profile, AuthTokens)> {
        let sql = format!("SELECT {} FROM profiles WHERE email = $1", PROFILE_COLUMNS);
        let profile: Option<Profile> = sqlx::query_as(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        // Verify a password hash regardless of whether the profile exists
        // so response time does not leak which emails are registered.
        let (profile, password_valid) = match profile {
            Some(p) => {
                let valid = self.verify_password(password, &p.password_hash)?;
                (Some(p), valid)
            }
            None => {
                let _ = self.verify_password(password, &self.dummy_password_hash);
                (None, false)
            }
        };

        let profile = match (profile, password_valid) {
            (Some(p), true) => p,
            (Some(_), false) => {
                tracing::warn!(email = %email, "Login failed: invalid password");
                return Err(ApiError::Unauthorized);
            }
            (None, _) => {
                tracing::warn!(email = %email, "Login failed: profile not found");
                return Err(ApiError::Unauthorized);
            }
        };

        let tokens = self.create_session(&profile).await?;

        sqlx::query("UPDATE profiles SET last_seen_at = NOW() WHERE id = $1")
            .bind(profile.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(profile_id = %profile.id, "Profile logged in successfully");

        Ok((profile, tokens))
    }

    /// Refresh authentication tokens using a valid refresh token
    ///
    /// Both tokens are rotated and the old refresh token stops working.
    ///
    /// # Errors
    /// - `ApiError::InvalidToken` if the refresh token or session is invalid
    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResult<AuthTokens> {
        let claims = self.verify_refresh_token(refresh_token)?;

        let refresh_token_hash = hash_token(refresh_token);
        let session = self
            .sessions
            .find_for_refresh(claims.sid, &refresh_token_hash)
            .await?
            .ok_or_else(|| ApiError::InvalidToken("session not found or inactive".to_string()))?;

        if session.expires_at < Utc::now() {
            self.sessions.deactivate(session.id).await?;
            return Err(ApiError::InvalidToken("session expired".to_string()));
        }

        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile: Profile = sqlx::query_as(&sql)
            .bind(session.profile_id)
            .fetch_one(&self.pool)
            .await?;

        let (access_token, new_refresh_token) = self.generate_token_pair(&profile, session.id)?;

        let access_expires_at = Utc::now() + Duration::seconds(self.config.access_token_ttl_secs);
        let session_expires_at = Utc::now() + Duration::seconds(self.config.refresh_token_ttl_secs);

        self.sessions
            .rotate_tokens(
                session.id,
                &hash_token(&access_token),
                &hash_token(&new_refresh_token),
                session_expires_at,
            )
            .await?;

        tracing::debug!(session_id = %session.id, profile_id = %profile.id, "Token refreshed successfully");

        Ok(AuthTokens::new(
            access_token,
            new_refresh_token,
            access_expires_at,
        ))
    }

    /// Logout a specific session
    ///
    /// # Errors
    /// - `ApiError::NotFound` if the session doesn't exist
    pub async fn logout(&self, session_id: Uuid) -> ApiResult<()> {
        if !self.sessions.deactivate(session_id).await? {
            return Err(ApiError::NotFound {
                resource_type: "session",
                id: session_id.to_string(),
            });
        }

        tracing::info!(session_id = %session_id, "Session logged out");
        Ok(())
    }

    /// Logout all sessions for a profile
    pub async fn logout_all(&self, profile_id: Uuid) -> ApiResult<u64> {
        let count = self.sessions.deactivate_all(profile_id).await?;
        tracing::info!(profile_id = %profile_id, sessions_invalidated = count, "All sessions logged out");
        Ok(count)
    }

    /// Verify an access token and return its claims
    ///
    /// # Errors
    /// - `ApiError::InvalidToken` if the token is invalid, expired, or malformed
    pub fn verify_access_token(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Access token verification failed");
            ApiError::InvalidToken(e.to_string())
        })?;

        Ok(token_data.claims)
    }

    /// Verify a refresh token and return its claims
    fn verify_refresh_token(&self, token: &str) -> ApiResult<RefreshClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Refresh token verification failed");
            ApiError::InvalidToken(e.to_string())
        })?;

        if token_data.claims.typ != "refresh" {
            return Err(ApiError::InvalidToken("expected refresh token".to_string()));
        }

        Ok(token_data.claims)
    }

    /// Create a new session for a profile
    async fn create_session(&self, profile: &Profile) -> ApiResult<AuthTokens> {
        let session_id = Uuid::new_v4();

        let (access_token, refresh_token) = self.generate_token_pair(profile, session_id)?;

        let access_expires_at = Utc::now() + Duration::seconds(self.config.access_token_ttl_secs);
        let session_expires_at = Utc::now() + Duration::seconds(self.config.refresh_token_ttl_secs);

        self.sessions
            .create(
                session_id,
                profile.id,
                &hash_token(&access_token),
                &hash_token(&refresh_token),
                session_expires_at,
            )
            .await?;

        Ok(AuthTokens::new(
            access_token,
            refresh_token,
            access_expires_at,
        ))
    }

    /// Generate a pair of access and refresh tokens
    fn generate_token_pair(
        &self,
        profile: &Profile,
        session_id: Uuid,
    ) -> ApiResult<(String, String)> {
        let access_claims = Claims::new(profile, session_id, self.config.access_token_ttl_secs);
        let refresh_claims =
            RefreshClaims::new(profile.id, session_id, self.config.refresh_token_ttl_secs);

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        Ok((access_token, refresh_token))
    }

    /// Hash a password with Argon2id
    fn hash_password(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against an Argon2id hash
    fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ApiError::Internal(format!("Invalid password hash format: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Hash a token using SHA-256 for secure storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Simple email validation
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 {
        return false;
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("15m"), Some(900));
        assert_eq!(parse_duration_string("7d"), Some(604800));
        assert_eq!(parse_duration_string("24h"), Some(86400));
        assert_eq!(parse_duration_string("30s"), Some(30));
        assert_eq!(parse_duration_string("1w"), Some(604800));
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("invalid"), None);
        assert_eq!(parse_duration_string("15x"), None);
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@domain.co.uk"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("missing@domain"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@domain.com"));
    }

    #[test]
    fn test_hash_token() {
        let token = "test_token_123";
        let hash = hash_token(token);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_token(token));
        assert_ne!(hash, hash_token("different_token"));
    }

    #[test]
    fn test_auth_config_new() {
        let config = AuthConfig::new("secret".to_string());
        assert_eq!(config.access_token_ttl_secs, 15 * 60);
        assert_eq!(config.refresh_token_ttl_secs, 7 * 24 * 3600);
        assert_eq!(config.issuer, "raindrops");
        assert_eq!(config.audience, "raindrops");
    }

    #[test]
    fn test_auth_config_with_expiry_strings() {
        let config = AuthConfig::with_expiry_strings("secret".to_string(), "30m", "14d");
        assert_eq!(config.access_token_ttl_secs, 30 * 60);
        assert_eq!(config.refresh_token_ttl_secs, 14 * 24 * 3600);
    }

    #[test]
    fn test_auth_config_invalid_expiry_uses_default() {
        let config =
            AuthConfig::with_expiry_strings("secret".to_string(), "invalid", "also_invalid");
        assert_eq!(config.access_token_ttl_secs, 15 * 60);
        assert_eq!(config.refresh_token_ttl_secs, 7 * 24 * 3600);
    }

    #[test]
    fn test_dummy_password_hash_verification_fails() {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"dummy_password_for_timing_attack_prevention", &salt)
            .expect("dummy password hashing should not fail")
            .to_string();

        let parsed = PasswordHash::new(&dummy_hash).unwrap();
        assert!(argon2
            .verify_password(b"attacker_password", &parsed)
            .is_err());
    }
}
