//! Authentication extractors for Axum handlers
//!
//! This module provides Axum extractors for authentication:
//! - `AuthUser`: Requires valid JWT token, returns 401 if missing/invalid
//! - `MaybeAuthUser`: Optional authentication, returns None if not authenticated
//! - `AuthorizedUser`: Requires the upload-authorization flag, returns 403 otherwise
//! - `GodUser`: Requires the godmode flag, returns 403 otherwise
//!
//! Privilege flags are re-read from the database on every request, so a
//! revoked flag takes effect immediately even for tokens issued earlier.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, ErrorResponse};
use crate::models::{Claims, Profile};
use crate::repositories::{ProfileRepository, SessionRepository};
use crate::services::AuthService;

/// Authenticated user extractor - requires valid authentication
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The authenticated profile
    pub profile: Profile,
    /// JWT claims from the access token
    pub claims: Claims,
    /// Session ID from the token
    pub session_id: Uuid,
}

/// Optional authentication extractor
///
/// Attempts to extract an authenticated user but doesn't fail if not
/// present.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser {
    /// The authenticated profile, if present
    pub profile: Option<Profile>,
}

/// Upload-authorization extractor
///
/// Requires `is_authorized` (godmode implies it). Returns 401 if not
/// authenticated, 403 if the flag is not set.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    /// The authenticated, upload-authorized profile
    pub profile: Profile,
    /// Session ID from the token
    pub session_id: Uuid,
}

/// God-mode extractor - requires the elevated-privilege flag
///
/// Returns 401 if not authenticated, 403 if the profile is not godmode.
#[derive(Debug, Clone)]
pub struct GodUser {
    /// The authenticated godmode profile
    pub profile: Profile,
    /// Session ID from the token
    pub session_id: Uuid,
}

/// Authentication rejection types
#[derive(Debug)]
pub enum AuthRejection {
    /// Missing or invalid Authorization header
    MissingToken,
    /// Token is malformed or expired
    InvalidToken(String),
    /// Database error while fetching the profile
    DatabaseError(String),
    /// Profile not found in database
    ProfileNotFound,
    /// Profile lacks the required privilege flag
    InsufficientPermissions(&'static str),
    /// Missing required services in app state
    MissingServices,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AuthRejection::MissingToken => {
                tracing::debug!("Authentication rejected: missing token");
                (StatusCode::UNAUTHORIZED, ApiError::Unauthorized)
            }
            AuthRejection::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Authentication rejected: invalid token");
                (StatusCode::UNAUTHORIZED, ApiError::InvalidToken(reason))
            }
            AuthRejection::DatabaseError(e) => {
                tracing::error!(error = %e, "Authentication rejected: database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::Internal(format!("Failed to fetch profile: {}", e)),
                )
            }
            AuthRejection::ProfileNotFound => {
                tracing::warn!("Authentication rejected: profile not found");
                (
                    StatusCode::UNAUTHORIZED,
                    ApiError::InvalidToken("profile not found".to_string()),
                )
            }
            AuthRejection::InsufficientPermissions(required) => {
                tracing::warn!(required, "Authentication rejected: insufficient permissions");
                (
                    StatusCode::FORBIDDEN,
                    ApiError::Forbidden(format!("{required} access required")),
                )
            }
            AuthRejection::MissingServices => {
                tracing::error!("Authentication rejected: missing services in app state");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::Internal("Authentication services not configured".to_string()),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: error.error_code(),
            message: error.to_string(),
            details: None,
        });

        (status, body).into_response()
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Shared verification path: token -> active session -> profile row
async fn authenticate(parts: &mut Parts) -> Result<(Profile, Claims), AuthRejection> {
    let token = extract_bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

    let auth_service = parts
        .extensions
        .get::<AuthService>()
        .ok_or(AuthRejection::MissingServices)?;

    let claims = auth_service
        .verify_access_token(token)
        .map_err(|e| AuthRejection::InvalidToken(e.to_string()))?;

    let session_repo = parts
        .extensions
        .get::<SessionRepository>()
        .ok_or(AuthRejection::MissingServices)?;

    // Session must still be active (prevents token reuse after logout)
    let session_active = session_repo
        .is_active(claims.sid, claims.sub)
        .await
        .map_err(|e| AuthRejection::DatabaseError(e.to_string()))?;

    if !session_active {
        return Err(AuthRejection::InvalidToken(
            "session is no longer active".to_string(),
        ));
    }

    let profile_repo = parts
        .extensions
        .get::<ProfileRepository>()
        .ok_or(AuthRejection::MissingServices)?;

    let profile = profile_repo
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AuthRejection::DatabaseError(e.to_string()))?
        .ok_or(AuthRejection::ProfileNotFound)?;

    Ok((profile, claims))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (profile, claims) = authenticate(parts).await?;
        Ok(AuthUser {
            profile,
            session_id: claims.sid,
            claims,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if extract_bearer_token(parts).is_none() {
            return Ok(MaybeAuthUser { profile: None });
        }

        match authenticate(parts).await {
            Ok((profile, _)) => Ok(MaybeAuthUser {
                profile: Some(profile),
            }),
            Err(AuthRejection::DatabaseError(e)) => {
                tracing::warn!(error = %e, "Database error in MaybeAuthUser");
                Ok(MaybeAuthUser { profile: None })
            }
            Err(_) => Ok(MaybeAuthUser { profile: None }),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (profile, claims) = authenticate(parts).await?;

        if !profile.is_authorized && !profile.is_godmode {
            return Err(AuthRejection::InsufficientPermissions("upload"));
        }

        Ok(AuthorizedUser {
            profile,
            session_id: claims.sid,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for GodUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Fast rejection on the claims flag before touching the database;
        // the database row is still the authority below.
        let token = extract_bearer_token(parts).ok_or(AuthRejection::MissingToken)?;
        let auth_service = parts
            .extensions
            .get::<AuthService>()
            .ok_or(AuthRejection::MissingServices)?;
        let claims = auth_service
            .verify_access_token(token)
            .map_err(|e| AuthRejection::InvalidToken(e.to_string()))?;
        if !claims.god {
            return Err(AuthRejection::InsufficientPermissions("god-mode"));
        }

        let (profile, claims) = authenticate(parts).await?;

        if !profile.is_godmode {
            return Err(AuthRejection::InsufficientPermissions("god-mode"));
        }

        Ok(GodUser {
            profile,
            session_id: claims.sid,
        })
    }
}
