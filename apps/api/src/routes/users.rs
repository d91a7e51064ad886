//! User administration REST route handlers
//!
//! - `GET /users` - List all profiles (god-mode)
//! - `PATCH /users/:id/flags` - Toggle privilege flags (god-mode)

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::GodUser;
use crate::models::Profile;
use crate::repositories::ProfileRepository;

/// Shared application state for user administration handlers
#[derive(Clone)]
pub struct UsersState {
    /// Profile repository
    pub profiles: ProfileRepository,
}

/// Create the users router
pub fn users_router(state: UsersState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/flags", patch(set_flags))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// Profile row in the admin table
#[derive(Debug, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_godmode: bool,
    pub is_authorized: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for AdminProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            is_godmode: profile.is_godmode,
            is_authorized: profile.is_authorized,
            last_seen_at: profile.last_seen_at,
            created_at: profile.created_at,
        }
    }
}

/// Flag toggle request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct SetFlagsRequest {
    pub is_godmode: Option<bool>,
    pub is_authorized: Option<bool>,
}

// ========== Route Handlers ==========

/// List all profiles
///
/// # Response
/// - 200 OK: Profiles, newest first
/// - 403 Forbidden: Caller is not god-mode
async fn list_users(
    State(state): State<UsersState>,
    _god: GodUser,
) -> ApiResult<impl IntoResponse> {
    let profiles = state.profiles.list_all().await?;
    let rows: Vec<AdminProfile> = profiles.into_iter().map(Into::into).collect();
    Ok(Json(rows))
}

/// Toggle privilege flags on a profile
///
/// # Request
/// - Method: PATCH
/// - Path: /users/:id/flags
/// - Headers: Authorization (god-mode required)
/// - Body: JSON with optional is_godmode, is_authorized
///
/// # Response
/// - 200 OK: Updated profile
/// - 400 Bad Request: Neither flag supplied
/// - 403 Forbidden: Caller is not god-mode
/// - 404 Not Found: Unknown profile id
async fn set_flags(
    State(state): State<UsersState>,
    god: GodUser,
    Path(profile_id): Path<Uuid>,
    Json(request): Json<SetFlagsRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.is_godmode.is_none() && request.is_authorized.is_none() {
        return Err(ApiError::ValidationError(
            "at least one flag must be supplied".to_string(),
        ));
    }

    let profile = state
        .profiles
        .set_flags(profile_id, request.is_godmode, request.is_authorized)
        .await?
        .ok_or_else(|| ApiError::not_found("profile", profile_id.to_string()))?;

    tracing::info!(
        profile_id = %profile_id,
        admin_id = %god.profile.id,
        is_godmode = profile.is_godmode,
        is_authorized = profile.is_authorized,
        "Privilege flags updated"
    );

    Ok(Json(AdminProfile::from(profile)))
}
