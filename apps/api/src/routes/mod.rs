//! HTTP route handlers for the Immortal Raindrops API
//!
//! This module contains all REST endpoint handlers including:
//! - Authentication endpoints
//! - The archive grid and track administration
//! - Votes
//! - Presigned upload flow
//! - Site/system settings and the stream webhook
//! - Health check and status endpoints

pub mod auth;
pub mod health;
pub mod settings;
pub mod tracks;
pub mod uploads;
pub mod users;
pub mod votes;
pub mod webhooks;

pub use auth::{auth_router, AuthRoutesState};
pub use health::{health_router, HealthState};
pub use settings::{settings_router, SettingsRoutesState};
pub use tracks::{tracks_router, TracksState};
pub use uploads::{uploads_router, UploadsState};
pub use users::{users_router, UsersState};
pub use votes::{votes_router, VotesState};
pub use webhooks::{webhooks_router, WebhooksState};
