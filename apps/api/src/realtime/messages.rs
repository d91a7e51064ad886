//! Realtime event payloads

use serde::{Deserialize, Serialize};

use crate::models::SiteSettings;

/// Events pushed to site-settings subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingsEvent {
    /// Current state, pushed once when a subscriber connects (and after
    /// a lagged subscriber resyncs)
    Snapshot { settings: SiteSettings },

    /// The site settings row changed (webhook or god-mode edit)
    SiteSettingsChanged { settings: SiteSettings },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn events_tag_by_type() {
        let event = SettingsEvent::SiteSettingsChanged {
            settings: SiteSettings {
                id: 1,
                is_live: true,
                stream_title: "Broadcast".to_string(),
                stream_url: None,
                updated_at: Utc::now(),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"site_settings_changed\""));

        let back: SettingsEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
