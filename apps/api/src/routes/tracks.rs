//! Track REST route handlers
//!
//! Provides the archive grid and per-track operations:
//! - `GET /tracks` - The ordered grid (public; static fallback on failure)
//! - `GET /tracks/:id` - One track with its vote score
//! - `PATCH /tracks/:id` - Edit metadata (god-mode)
//! - `DELETE /tracks/:id` - Remove a tile and its stored objects (god-mode)

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use raindrops_storage_client::StorageClient;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{GodUser, MaybeAuthUser};
use crate::models::{Track, UpdateTrack};
use crate::repositories::{TrackRepository, VoteRepository};
use crate::services::{CatalogService, CatalogTile};

/// Shared application state for track handlers
#[derive(Clone)]
pub struct TracksState {
    /// Catalog service for the grid
    pub catalog: CatalogService,
    /// Track repository
    pub tracks: TrackRepository,
    /// Vote repository for per-user vote decoration
    pub votes: VoteRepository,
    /// Object storage client for tile deletion
    pub storage: StorageClient,
}

/// Create the tracks router
pub fn tracks_router(state: TracksState) -> Router {
    Router::new()
        .route("/", get(grid))
        .route("/:id", get(get_track).patch(update_track).delete(delete_track))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// One grid tile, decorated with the caller's vote when authenticated
#[derive(Debug, Serialize)]
pub struct GridTile {
    /// Track metadata plus aggregate score
    #[serde(flatten)]
    pub tile: CatalogTile,

    /// The caller's vote on this track, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<i16>,
}

/// Grid response
#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub tiles: Vec<GridTile>,
}

/// Single track response
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    #[serde(flatten)]
    pub track: Track,
    pub score: i64,
}

// ========== Route Handlers ==========

/// The ordered archive grid
///
/// # Request
/// - Method: GET
/// - Path: /tracks
/// - Headers: optional Authorization (adds the caller's votes)
///
/// # Response
/// - 200 OK: Tiles sorted by tile index ascending. When the database is
///   unreachable or empty the built-in fallback grid is served instead,
///   so this endpoint never fails.
async fn grid(State(state): State<TracksState>, auth: MaybeAuthUser) -> impl IntoResponse {
    let tiles = state.catalog.grid().await;

    let my_votes = match &auth.profile {
        Some(profile) => match state.votes.votes_by_profile(profile.id).await {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load caller votes for grid");
                std::collections::HashMap::new()
            }
        },
        None => std::collections::HashMap::new(),
    };

    let tiles = tiles
        .into_iter()
        .map(|tile| {
            let my_vote = my_votes.get(&tile.track.id).copied();
            GridTile { tile, my_vote }
        })
        .collect();

    Json(GridResponse { tiles })
}

/// One track with its aggregate vote score
///
/// # Response
/// - 200 OK: Track data
/// - 404 Not Found: Unknown track id
async fn get_track(
    State(state): State<TracksState>,
    Path(track_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::not_found("track", track_id.to_string()))?;

    let score = state.votes.score(track_id).await?;

    Ok(Json(TrackResponse { track, score }))
}

/// Edit track metadata
///
/// # Request
/// - Method: PATCH
/// - Path: /tracks/:id
/// - Headers: Authorization (god-mode required)
/// - Body: JSON with optional title, artist, genre, released_on
///
/// # Response
/// - 200 OK: Updated track
/// - 403 Forbidden: Caller is not god-mode
/// - 404 Not Found: Unknown track id
async fn update_track(
    State(state): State<TracksState>,
    god: GodUser,
    Path(track_id): Path<Uuid>,
    Json(input): Json<UpdateTrack>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(ApiError::ValidationError("title must not be empty".to_string()));
        }
    }

    let track = state
        .tracks
        .update(track_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("track", track_id.to_string()))?;

    tracing::info!(
        track_id = %track_id,
        admin_id = %god.profile.id,
        "Track metadata updated"
    );

    Ok(Json(track))
}

/// Delete a tile
///
/// Attempts object-storage deletion first (best-effort, failures are
/// logged but do not abort), then removes the database row; votes
/// cascade with it.
///
/// # Response
/// - 204 No Content: Tile removed
/// - 403 Forbidden: Caller is not god-mode
/// - 404 Not Found: Unknown track id
async fn delete_track(
    State(state): State<TracksState>,
    god: GodUser,
    Path(track_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let track = state
        .tracks
        .find_by_id(track_id)
        .await?
        .ok_or_else(|| ApiError::not_found("track", track_id.to_string()))?;

    let keys = track.storage_keys();
    let deleted = state.storage.delete_best_effort(&keys).await;
    if deleted < keys.len() {
        tracing::warn!(
            track_id = %track_id,
            attempted = keys.len(),
            deleted,
            "some tile objects could not be deleted"
        );
    }

    state.tracks.delete(track_id).await?;

    tracing::info!(
        track_id = %track_id,
        tile_index = track.tile_index,
        admin_id = %god.profile.id,
        "Tile deleted"
    );

    Ok(axum::http::StatusCode::NO_CONTENT)
}
