//! Site and system settings models
//!
//! Both tables are singletons (id = 1, seeded by the initial migration).
//! Site settings hold the live-broadcast state and are the subject of the
//! realtime change subscription; system settings hold operational flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Live broadcast state from the site_settings singleton
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Always 1 (singleton constraint)
    pub id: i32,

    /// Whether the live broadcast override is active
    pub is_live: bool,

    /// Current stream title shown in the player
    pub stream_title: String,

    /// Stream URL the player switches to while live
    pub stream_url: Option<String>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for updating site settings
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettingsInput {
    /// Whether the live broadcast override is active
    pub is_live: bool,

    /// Stream title shown in the player
    pub stream_title: String,

    /// Stream URL the player switches to while live
    pub stream_url: Option<String>,
}

/// Operational flags from the system_settings singleton
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SystemSettings {
    /// Always 1 (singleton constraint)
    pub id: i32,

    /// Whether the site is in maintenance mode
    pub maintenance_mode: bool,

    /// Site-wide announcement banner text
    pub announcement: Option<String>,

    /// Profile that last updated these settings
    pub updated_by: Option<Uuid>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for updating system settings
#[derive(Debug, Clone, Deserialize)]
pub struct SystemSettingsInput {
    /// Whether the site is in maintenance mode
    pub maintenance_mode: bool,

    /// Site-wide announcement banner text
    pub announcement: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_settings_serde_roundtrip() {
        let settings = SiteSettings {
            id: 1,
            is_live: true,
            stream_title: "Friday Broadcast".to_string(),
            stream_url: Some("https://live.example/stream".to_string()),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&settings).unwrap();
        let back: SiteSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
