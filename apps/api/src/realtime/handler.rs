//! WebSocket handler for the site-settings subscription
//!
//! `GET /ws/settings` upgrades to a WebSocket that receives the current
//! site settings as a snapshot, then every change event. Clients only
//! listen; inbound frames other than close are ignored.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::SettingsEvent;
use super::pubsub::SettingsPubSub;
use crate::repositories::SettingsRepository;

/// Shared application state for the realtime handlers
#[derive(Clone)]
pub struct RealtimeState {
    /// Settings event fan-out
    pub pubsub: SettingsPubSub,
    /// Settings repository for snapshots
    pub settings: SettingsRepository,
}

impl RealtimeState {
    /// Create new realtime state
    pub fn new(pubsub: SettingsPubSub, settings: SettingsRepository) -> Self {
        Self { pubsub, settings }
    }
}

/// Create the realtime router
pub fn realtime_router(state: RealtimeState) -> Router {
    Router::new()
        .route("/settings", get(settings_ws))
        .with_state(state)
}

/// Upgrade to the settings subscription socket
async fn settings_ws(
    State(state): State<RealtimeState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Push a snapshot, then relay change events until the peer disconnects
async fn handle_socket(socket: WebSocket, state: RealtimeState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.pubsub.subscribe();

    if !send_snapshot(&mut sender, &state).await {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "settings subscriber lagged, resyncing");
                    if !send_snapshot(&mut sender, &state).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = next_frame(&mut receiver) => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "websocket receive error");
                    break;
                }
            },
        }
    }
}

async fn next_frame(
    receiver: &mut SplitStream<WebSocket>,
) -> Option<Result<Message, axum::Error>> {
    receiver.next().await
}

/// Send the current settings as a snapshot event; false when the socket
/// is gone
async fn send_snapshot(sender: &mut SplitSink<WebSocket, Message>, state: &RealtimeState) -> bool {
    match state.settings.get_site().await {
        Ok(settings) => send_event(sender, &SettingsEvent::Snapshot { settings }).await,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings snapshot");
            true
        }
    }
}

async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &SettingsEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize settings event");
            true
        }
    }
}
