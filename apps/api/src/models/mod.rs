//! Database models and types for the Immortal Raindrops API
//!
//! This module contains SQLx models for:
//! - Profiles, sessions, and JWT claims
//! - Archive tracks (tiles)
//! - Votes
//! - Site and system settings singletons

pub mod profile;
pub mod settings;
pub mod track;
pub mod vote;

pub use profile::{AuthTokens, Claims, Profile, RefreshClaims};
pub use settings::{SiteSettings, SiteSettingsInput, SystemSettings, SystemSettingsInput};
pub use track::{CreateTrack, MediaType, Track, UpdateTrack};
pub use vote::{Vote, VoteStatus, VoteValue};
