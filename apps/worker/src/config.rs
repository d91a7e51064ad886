//! Worker configuration loaded from environment variables
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development environments.

use std::env;

use anyhow::{Context, Result};
use raindrops_shared_config::CommonConfig;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the API
    pub common: CommonConfig,

    /// Seconds between orphan sweeps
    pub sweep_interval_secs: u64,

    /// Minimum object age in seconds before an unregistered tile prefix
    /// is considered orphaned (covers uploads still awaiting finalize)
    pub orphan_grace_secs: i64,

    /// Report orphans without deleting anything
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,

            sweep_interval_secs: env::var("SWEEP_INTERVAL")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL value")?,

            orphan_grace_secs: env::var("ORPHAN_GRACE")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid ORPHAN_GRACE value")?,

            dry_run: env::var("SWEEP_DRY_RUN")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
