//! Realtime change distribution
//!
//! One subscription exists in this system: site-settings changes (live
//! broadcast started/stopped, stream title). Events fan out through a
//! broadcast channel, optionally backed by Redis pub/sub so multiple API
//! instances stay in sync, and reach clients over a WebSocket route.

pub mod handler;
pub mod messages;
pub mod pubsub;

pub use handler::{realtime_router, RealtimeState};
pub use messages::SettingsEvent;
pub use pubsub::SettingsPubSub;
