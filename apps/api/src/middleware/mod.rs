//! Middleware components for the Immortal Raindrops API
//!
//! This module provides authentication extractors for Axum handlers:
//! - `AuthUser`: Requires valid authentication, returns 401 if missing/invalid
//! - `MaybeAuthUser`: Optional authentication, returns None if not authenticated
//! - `AuthorizedUser`: Requires the upload-authorization flag, returns 403 otherwise
//! - `GodUser`: Requires the godmode flag, returns 403 otherwise

pub mod auth;

pub use auth::{AuthRejection, AuthUser, AuthorizedUser, GodUser, MaybeAuthUser};
