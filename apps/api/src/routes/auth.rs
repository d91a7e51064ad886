//! Authentication REST route handlers
//!
//! Provides endpoints for account management:
//! - `POST /auth/register` - Create a new profile
//! - `POST /auth/login` - Authenticate and get tokens
//! - `POST /auth/refresh` - Refresh access token
//! - `DELETE /auth/logout` - Invalidate current session
//! - `GET /auth/me` - The authenticated profile

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::{AuthTokens, Profile};
use crate::services::AuthService;

/// Shared application state for auth handlers
#[derive(Clone)]
pub struct AuthRoutesState {
    /// Authentication service
    pub auth_service: Arc<AuthService>,
}

impl AuthRoutesState {
    /// Create new auth state
    pub fn new(auth_service: AuthService) -> Self {
        Self {
            auth_service: Arc::new(auth_service),
        }
    }
}

/// Create the authentication router
pub fn auth_router(state: AuthRoutesState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", delete(logout))
        .route("/me", get(me))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Display/login name
    pub username: String,
    /// Password (min 8 characters)
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Refresh token request body
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token from a previous login/refresh
    pub refresh_token: String,
}

/// Profile response (safe to return to the client)
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_godmode: bool,
    pub is_authorized: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            is_godmode: profile.is_godmode,
            is_authorized: profile.is_authorized,
        }
    }
}

/// Registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub profile: ProfileResponse,
    pub tokens: AuthTokens,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub profile: ProfileResponse,
    pub tokens: AuthTokens,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub tokens: AuthTokens,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

// ========== Route Handlers ==========

/// Register a new profile
///
/// # Request
/// - Method: POST
/// - Path: /auth/register
/// - Body: JSON with email, username, password
///
/// # Response
/// - 201 Created: Profile registered with a fresh session
/// - 400 Bad Request: Invalid input (weak password, invalid email)
/// - 409 Conflict: Email or username already exists
///
/// A session is created immediately after registration, avoiding the
/// extra Argon2 verification a separate login would cost.
async fn register(
    State(state): State<AuthRoutesState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (profile, tokens) = state
        .auth_service
        .register_with_session(&request.email, &request.username, &request.password)
        .await?;

    let response = RegisterResponse {
        profile: profile.into(),
        tokens,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// # Request
/// - Method: POST
/// - Path: /auth/login
/// - Body: JSON with email, password
///
/// # Response
/// - 200 OK: Login successful with tokens
/// - 401 Unauthorized: Invalid credentials
async fn login(
    State(state): State<AuthRoutesState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (profile, tokens) = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    let response = LoginResponse {
        profile: profile.into(),
        tokens,
    };

    Ok(Json(response))
}

/// Refresh access token using refresh token
///
/// # Request
/// - Method: POST
/// - Path: /auth/refresh
/// - Body: JSON with refresh_token
///
/// # Response
/// - 200 OK: New tokens issued (both tokens rotate)
/// - 401 Unauthorized: Invalid or expired refresh token
async fn refresh(
    State(state): State<AuthRoutesState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let tokens = state
        .auth_service
        .refresh_token(&request.refresh_token)
        .await?;

    Ok(Json(RefreshResponse { tokens }))
}

/// Logout and invalidate the current session
///
/// # Request
/// - Method: DELETE
/// - Path: /auth/logout
/// - Headers: Authorization: Bearer <access_token>
///
/// # Response
/// - 200 OK: Session invalidated
/// - 401 Unauthorized: Missing or invalid token
///
/// The session ID comes from the authenticated user's JWT claims, so a
/// profile can only invalidate its own sessions.
async fn logout(
    State(state): State<AuthRoutesState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    state.auth_service.logout(auth.session_id).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// The authenticated profile
///
/// # Request
/// - Method: GET
/// - Path: /auth/me
/// - Headers: Authorization: Bearer <access_token>
///
/// # Response
/// - 200 OK: Profile data
/// - 401 Unauthorized: Missing or invalid token
async fn me(auth: AuthUser) -> ApiResult<impl IntoResponse> {
    Ok(Json(ProfileResponse::from(auth.profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_profile_response_hides_password_hash() {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: "drift".to_string(),
            email: "drift@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            is_godmode: false,
            is_authorized: true,
            last_seen_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response: ProfileResponse = profile.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("drift@example.com"));
        assert!(response.is_authorized);
        assert!(!response.is_godmode);
    }
}
