//! Object storage configuration types

use crate::{get_env_or_default, parse_env, ConfigResult};

/// S3-compatible object storage configuration
///
/// Credentials are resolved through the standard AWS provider chain
/// (environment variables, shared credentials file, instance metadata),
/// so only the bucket layout and endpoint are configured here.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket holding all tile objects
    pub bucket: String,

    /// Region passed to the SDK (S3-compatible stores accept any value)
    pub region: String,

    /// Custom endpoint URL for S3-compatible stores (MinIO, Garage, ...)
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most S3-compatible stores)
    pub force_path_style: bool,

    /// Lifetime of presigned upload URLs in seconds
    pub presign_expiry_secs: u64,
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let endpoint = std::env::var("STORAGE_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            bucket: get_env_or_default("STORAGE_BUCKET", "raindrops-tiles"),
            region: get_env_or_default("STORAGE_REGION", "us-east-1"),
            // Custom endpoints default to path-style; virtual-hosted style
            // only works against real AWS
            force_path_style: parse_env("STORAGE_FORCE_PATH_STYLE", endpoint.is_some())?,
            endpoint,
            presign_expiry_secs: parse_env("STORAGE_PRESIGN_EXPIRY", 900)?,
        })
    }

    /// Create a configuration pointing at a custom endpoint (useful for testing)
    pub fn with_endpoint(bucket: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_string(),
            endpoint: Some(endpoint.into()),
            force_path_style: true,
            presign_expiry_secs: 900,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "raindrops-tiles".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            force_path_style: false,
            presign_expiry_secs: 900,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.bucket, "raindrops-tiles");
        assert!(config.endpoint.is_none());
        assert!(!config.force_path_style);
        assert_eq!(config.presign_expiry_secs, 900);
    }

    #[test]
    fn test_with_endpoint() {
        let config = StorageConfig::with_endpoint("test-bucket", "http://localhost:9000");
        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(config.force_path_style);
    }
}
