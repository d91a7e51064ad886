//! Vote REST route handlers
//!
//! - `PUT /tracks/:id/vote` - Toggle the caller's vote on a track
//!
//! Toggle semantics: sending the value already stored removes the vote,
//! the opposite value updates in place, and no existing vote inserts.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::VoteValue;
use crate::repositories::{TrackRepository, VoteRepository};

/// Shared application state for vote handlers
#[derive(Clone)]
pub struct VotesState {
    /// Vote repository
    pub votes: VoteRepository,
    /// Track repository for existence checks
    pub tracks: TrackRepository,
}

/// Create the votes router (nested under /tracks)
pub fn votes_router(state: VotesState) -> Router {
    Router::new()
        .route("/:id/vote", put(toggle_vote))
        .with_state(state)
}

/// Vote request body
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// +1 or -1
    pub value: VoteValue,
}

/// Toggle the caller's vote on a track
///
/// # Request
/// - Method: PUT
/// - Path: /tracks/:id/vote
/// - Headers: Authorization: Bearer <access_token>
/// - Body: JSON with value (1 or -1)
///
/// # Response
/// - 200 OK: `{my_vote, score}` after the operation; my_vote is null
///   when the vote was toggled off
/// - 401 Unauthorized: Missing or invalid token
/// - 404 Not Found: Unknown track id
async fn toggle_vote(
    State(state): State<VotesState>,
    auth: AuthUser,
    Path(track_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<impl IntoResponse> {
    if state.tracks.find_by_id(track_id).await?.is_none() {
        return Err(ApiError::not_found("track", track_id.to_string()));
    }

    let status = state
        .votes
        .toggle(auth.profile.id, track_id, request.value)
        .await?;

    tracing::debug!(
        profile_id = %auth.profile.id,
        track_id = %track_id,
        my_vote = ?status.my_vote,
        score = status.score,
        "Vote toggled"
    );

    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_request_accepts_only_signed_units() {
        let up: VoteRequest = serde_json::from_str(r#"{"value": 1}"#).unwrap();
        assert_eq!(up.value, VoteValue::Up);

        let down: VoteRequest = serde_json::from_str(r#"{"value": -1}"#).unwrap();
        assert_eq!(down.value, VoteValue::Down);

        assert!(serde_json::from_str::<VoteRequest>(r#"{"value": 0}"#).is_err());
        assert!(serde_json::from_str::<VoteRequest>(r#"{"value": 5}"#).is_err());
    }
}
