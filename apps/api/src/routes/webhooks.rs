//! Inbound webhook handlers
//!
//! - `POST /webhooks/stream` - Lifecycle events from the external
//!   streaming server (started, stopped, title updated), translated into
//!   a site-settings update and a realtime publish.
//!
//! Authenticated by a shared secret in the `X-Webhook-Token` header.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ApiResult};
use crate::models::{SiteSettings, SiteSettingsInput};
use crate::realtime::{SettingsEvent, SettingsPubSub};
use crate::repositories::SettingsRepository;

/// Header carrying the shared webhook secret
const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

/// Shared application state for webhook handlers
#[derive(Clone)]
pub struct WebhooksState {
    /// Settings repository
    pub settings: SettingsRepository,
    /// Realtime fan-out for site-settings changes
    pub pubsub: SettingsPubSub,
    /// Shared secret expected in the token header
    pub webhook_token: String,
}

/// Create the webhooks router
pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        .route("/stream", post(stream_event))
        .with_state(state)
}

/// Lifecycle events emitted by the streaming server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamLifecycleEvent {
    /// A broadcast went live
    StreamStarted {
        title: Option<String>,
        url: Option<String>,
    },
    /// The broadcast ended
    StreamStopped,
    /// The broadcast title changed mid-stream
    TitleUpdated { title: String },
}

/// Map a lifecycle event onto the current site settings
fn apply_event(current: &SiteSettings, event: &StreamLifecycleEvent) -> SiteSettingsInput {
    match event {
        StreamLifecycleEvent::StreamStarted { title, url } => SiteSettingsInput {
            is_live: true,
            stream_title: title
                .clone()
                .unwrap_or_else(|| current.stream_title.clone()),
            stream_url: url.clone().or_else(|| current.stream_url.clone()),
        },
        StreamLifecycleEvent::StreamStopped => SiteSettingsInput {
            is_live: false,
            stream_title: current.stream_title.clone(),
            stream_url: current.stream_url.clone(),
        },
        StreamLifecycleEvent::TitleUpdated { title } => SiteSettingsInput {
            is_live: current.is_live,
            stream_title: title.clone(),
            stream_url: current.stream_url.clone(),
        },
    }
}

/// Compare the presented token against the configured secret
///
/// Both sides are hashed first so the comparison runs over fixed-length
/// digests rather than the secrets themselves.
fn token_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented == expected
}

/// Translate a streaming-server lifecycle event into a settings update
///
/// # Request
/// - Method: POST
/// - Path: /webhooks/stream
/// - Headers: X-Webhook-Token: <shared secret>
/// - Body: JSON with event (stream_started | stream_stopped | title_updated)
///
/// # Response
/// - 200 OK: Settings updated and change published
/// - 401 Unauthorized: Missing or wrong token
async fn stream_event(
    State(state): State<WebhooksState>,
    headers: HeaderMap,
    Json(event): Json<StreamLifecycleEvent>,
) -> ApiResult<impl IntoResponse> {
    let presented = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if !token_matches(presented, &state.webhook_token) {
        tracing::warn!("stream webhook rejected: bad token");
        return Err(ApiError::Unauthorized);
    }

    let current = state.settings.get_site().await?;
    let input = apply_event(&current, &event);
    let settings = state.settings.update_site(&input).await?;

    state
        .pubsub
        .publish(SettingsEvent::SiteSettingsChanged {
            settings: settings.clone(),
        })
        .await;

    tracing::info!(
        event = ?event,
        is_live = settings.is_live,
        stream_title = %settings.stream_title,
        "Stream lifecycle event applied"
    );

    Ok((StatusCode::OK, Json(settings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn current() -> SiteSettings {
        SiteSettings {
            id: 1,
            is_live: false,
            stream_title: "Off Air".to_string(),
            stream_url: Some("https://live.example/stream".to_string()),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stream_started_sets_live_and_title() {
        let event = StreamLifecycleEvent::StreamStarted {
            title: Some("Friday Broadcast".to_string()),
            url: None,
        };
        let input = apply_event(&current(), &event);

        assert!(input.is_live);
        assert_eq!(input.stream_title, "Friday Broadcast");
        // URL falls back to the stored one
        assert_eq!(
            input.stream_url.as_deref(),
            Some("https://live.example/stream")
        );
    }

    #[test]
    fn stream_started_without_title_keeps_current() {
        let event = StreamLifecycleEvent::StreamStarted {
            title: None,
            url: None,
        };
        let input = apply_event(&current(), &event);
        assert!(input.is_live);
        assert_eq!(input.stream_title, "Off Air");
    }

    #[test]
    fn stream_stopped_clears_live_only() {
        let mut state = current();
        state.is_live = true;

        let input = apply_event(&state, &StreamLifecycleEvent::StreamStopped);
        assert!(!input.is_live);
        assert_eq!(input.stream_title, "Off Air");
    }

    #[test]
    fn title_updated_keeps_live_state() {
        let mut state = current();
        state.is_live = true;

        let event = StreamLifecycleEvent::TitleUpdated {
            title: "New Title".to_string(),
        };
        let input = apply_event(&state, &event);
        assert!(input.is_live);
        assert_eq!(input.stream_title, "New Title");
    }

    #[test]
    fn token_comparison() {
        assert!(token_matches("secret", "secret"));
        assert!(!token_matches("secret", "other"));
        assert!(!token_matches("", "secret"));
    }

    #[test]
    fn lifecycle_events_deserialize_by_tag() {
        let started: StreamLifecycleEvent = serde_json::from_str(
            r#"{"event": "stream_started", "title": "Broadcast", "url": "https://x/s"}"#,
        )
        .unwrap();
        assert!(matches!(started, StreamLifecycleEvent::StreamStarted { .. }));

        let stopped: StreamLifecycleEvent =
            serde_json::from_str(r#"{"event": "stream_stopped"}"#).unwrap();
        assert!(matches!(stopped, StreamLifecycleEvent::StreamStopped));

        assert!(serde_json::from_str::<StreamLifecycleEvent>(r#"{"event": "unknown"}"#).is_err());
    }
}
