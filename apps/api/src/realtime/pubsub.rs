//! Settings pub/sub for cross-instance synchronization
//!
//! This module provides real-time distribution of site-settings changes
//! using Redis pub/sub for multi-instance deployments, with an in-memory
//! fallback for single instance mode when Redis is unavailable.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::messages::SettingsEvent;

/// Channel capacity for broadcast channels
const BROADCAST_CAPACITY: usize = 256;

/// Redis channel carrying settings events
const REDIS_CHANNEL: &str = "raindrops:settings";

/// Settings pub/sub system with Redis + in-memory fallback
#[derive(Clone)]
pub struct SettingsPubSub {
    inner: Arc<SettingsPubSubInner>,
}

enum SettingsPubSubInner {
    /// Redis-backed pub/sub for multi-instance deployments
    Redis(RedisPubSub),
    /// In-memory pub/sub for single-instance mode
    InMemory(InMemoryPubSub),
}

impl SettingsPubSub {
    /// Create a new pub/sub system with Redis
    pub fn new_with_redis(client: redis::Client) -> Self {
        Self {
            inner: Arc::new(SettingsPubSubInner::Redis(RedisPubSub::new(client))),
        }
    }

    /// Create a new in-memory pub/sub system (single instance mode)
    pub fn new_in_memory() -> Self {
        Self {
            inner: Arc::new(SettingsPubSubInner::InMemory(InMemoryPubSub::new())),
        }
    }

    /// Try to create with Redis, fall back to in-memory
    pub async fn try_with_redis(redis_url: &str) -> Self {
        match redis::Client::open(redis_url) {
            Ok(client) => match client.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                    if pong.is_ok() {
                        tracing::info!("Redis pub/sub connected for settings sync");
                        return Self::new_with_redis(client);
                    }
                    tracing::warn!("Redis ping failed for settings pub/sub");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis pub/sub connection failed");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Redis client creation failed for pub/sub");
            }
        }

        tracing::warn!("Using in-memory settings pub/sub (single instance mode only)");
        Self::new_in_memory()
    }

    /// Publish a settings event to every subscriber
    pub async fn publish(&self, event: SettingsEvent) {
        match &*self.inner {
            SettingsPubSubInner::Redis(redis) => redis.publish(event).await,
            SettingsPubSubInner::InMemory(memory) => memory.publish(event),
        }
    }

    /// Subscribe to settings events
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        match &*self.inner {
            SettingsPubSubInner::Redis(redis) => redis.subscribe(),
            SettingsPubSubInner::InMemory(memory) => memory.subscribe(),
        }
    }

    /// Check if we're using Redis (multi-instance capable)
    pub fn is_redis_backed(&self) -> bool {
        matches!(&*self.inner, SettingsPubSubInner::Redis(_))
    }
}

/// Redis-backed pub/sub implementation
struct RedisPubSub {
    client: redis::Client,
    /// Local broadcast for redistribution to local subscribers
    local_sender: broadcast::Sender<SettingsEvent>,
}

impl RedisPubSub {
    fn new(client: redis::Client) -> Self {
        let (local_sender, _) = broadcast::channel(BROADCAST_CAPACITY);

        let pubsub = Self {
            client,
            local_sender,
        };

        // Background task relays Redis messages to local subscribers
        pubsub.start_listener();

        pubsub
    }

    fn start_listener(&self) {
        let client = self.client.clone();
        let sender = self.local_sender.clone();

        tokio::spawn(async move {
            const MAX_RECONNECT_DELAY_SECS: u64 = 60;
            const MAX_RECONNECT_ATTEMPTS: u32 = 100;

            let mut attempts = 0u32;
            let mut delay_secs = 1u64;

            loop {
                match Self::run_listener(&client, &sender).await {
                    Ok(()) => {
                        tracing::warn!("Redis pub/sub listener disconnected, reconnecting...");
                        attempts = 0;
                        delay_secs = 1;
                    }
                    Err(e) => {
                        attempts += 1;
                        if attempts >= MAX_RECONNECT_ATTEMPTS {
                            tracing::error!(
                                "Redis pub/sub max reconnect attempts ({}) exceeded, giving up",
                                MAX_RECONNECT_ATTEMPTS
                            );
                            break;
                        }
                        tracing::error!(
                            error = %e,
                            attempt = attempts,
                            delay_secs = delay_secs,
                            "Redis pub/sub listener error, reconnecting..."
                        );
                    }
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(delay_secs)).await;
                delay_secs = (delay_secs * 2).min(MAX_RECONNECT_DELAY_SECS);
            }
        });
    }

    async fn run_listener(
        client: &redis::Client,
        sender: &broadcast::Sender<SettingsEvent>,
    ) -> Result<(), redis::RedisError> {
        use futures_util::StreamExt;

        let conn = client.get_async_connection().await?;
        let mut pubsub = conn.into_pubsub();

        pubsub.subscribe(REDIS_CHANNEL).await?;

        let mut stream = pubsub.on_message();

        while let Some(msg) = stream.next().await {
            let payload: Vec<u8> = msg.get_payload_bytes().to_vec();

            if let Ok(payload_str) = String::from_utf8(payload) {
                if let Ok(event) = serde_json::from_str::<SettingsEvent>(&payload_str) {
                    let _ = sender.send(event);
                }
            }
        }

        Ok(())
    }

    async fn publish(&self, event: SettingsEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => match self.client.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    let result: Result<(), _> = redis::cmd("PUBLISH")
                        .arg(REDIS_CHANNEL)
                        .arg(&payload)
                        .query_async(&mut conn)
                        .await;

                    if let Err(e) = result {
                        tracing::error!(error = %e, "Failed to publish to Redis");
                        // Fall back to local broadcast
                        let _ = self.local_sender.send(event);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to get Redis connection for publish");
                    let _ = self.local_sender.send(event);
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize settings event");
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.local_sender.subscribe()
    }
}

/// In-memory pub/sub implementation for single-instance mode
struct InMemoryPubSub {
    sender: broadcast::Sender<SettingsEvent>,
}

impl InMemoryPubSub {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    fn publish(&self, event: SettingsEvent) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteSettings;
    use chrono::Utc;

    fn test_event() -> SettingsEvent {
        SettingsEvent::SiteSettingsChanged {
            settings: SiteSettings {
                id: 1,
                is_live: true,
                stream_title: "Broadcast".to_string(),
                stream_url: Some("https://live.example/stream".to_string()),
                updated_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_in_memory_pubsub() {
        let pubsub = SettingsPubSub::new_in_memory();
        let mut rx = pubsub.subscribe();

        pubsub.publish(test_event()).await;

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, SettingsEvent::SiteSettingsChanged { .. }));
    }

    #[tokio::test]
    async fn test_in_memory_pubsub_fans_out() {
        let pubsub = SettingsPubSub::new_in_memory();
        let mut rx1 = pubsub.subscribe();
        let mut rx2 = pubsub.subscribe();

        pubsub.publish(test_event()).await;

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let pubsub = SettingsPubSub::new_in_memory();
        // No receivers: must not panic or error
        pubsub.publish(test_event()).await;
    }

    #[test]
    fn test_is_redis_backed() {
        let in_memory = SettingsPubSub::new_in_memory();
        assert!(!in_memory.is_redis_backed());
    }
}
