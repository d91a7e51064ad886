//! Upload REST route handlers
//!
//! Two-step presigned upload flow for authorized profiles:
//! - `POST /uploads/presign` - Reserve the next tile index and get
//!   presigned PUT URLs for direct-to-storage upload
//! - `POST /uploads/finalize` - Register the metadata row once the
//!   objects are uploaded
//!
//! The index reservation is advisory (max + 1 without a lock); the
//! UNIQUE constraint on tile_index arbitrates races, surfacing the loser
//! as 409 at finalize. Objects uploaded for a finalize that never
//! arrives are reclaimed by the worker's orphan sweep.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use raindrops_storage_client::{keys, StorageClient};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthorizedUser;
use crate::models::CreateTrack;
use crate::repositories::TrackRepository;

/// Shared application state for upload handlers
#[derive(Clone)]
pub struct UploadsState {
    /// Track repository
    pub tracks: TrackRepository,
    /// Object storage client
    pub storage: StorageClient,
}

/// Create the uploads router
pub fn uploads_router(state: UploadsState) -> Router {
    Router::new()
        .route("/presign", post(presign))
        .route("/finalize", post(finalize))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// Presign request body
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    /// Extension of the audio/video file about to be uploaded
    pub audio_ext: String,
    /// Extension of the cover visual, if one will be uploaded
    pub image_ext: Option<String>,
}

/// One presigned upload slot
#[derive(Debug, Serialize)]
pub struct UploadSlot {
    /// Object key the URL writes to
    pub key: String,
    /// Time-limited PUT URL
    pub url: String,
}

/// Presign response
#[derive(Debug, Serialize)]
pub struct PresignResponse {
    /// Reserved tile index; pass it back to finalize
    pub tile_index: i32,
    /// Audio upload slot
    pub audio: UploadSlot,
    /// Visual upload slot, when an image extension was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<UploadSlot>,
    /// Seconds until the URLs expire
    pub expires_in_secs: u64,
}

// ========== Route Handlers ==========

/// Reserve the next tile index and presign upload URLs
///
/// # Request
/// - Method: POST
/// - Path: /uploads/presign
/// - Headers: Authorization (upload authorization required)
/// - Body: JSON with audio_ext and optional image_ext
///
/// # Response
/// - 200 OK: Presigned PUT URLs targeting the derived tile keys
/// - 400 Bad Request: Unsupported extension
/// - 403 Forbidden: Caller is not authorized to upload
async fn presign(
    State(state): State<UploadsState>,
    auth: AuthorizedUser,
    Json(request): Json<PresignRequest>,
) -> ApiResult<impl IntoResponse> {
    keys::validate_audio_ext(&request.audio_ext)
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;
    if let Some(ext) = &request.image_ext {
        keys::validate_image_ext(ext).map_err(|e| ApiError::ValidationError(e.to_string()))?;
    }

    let tile_index = state.tracks.next_tile_index().await?;

    let audio_key = keys::audio_key(tile_index, &request.audio_ext);
    let audio_upload = state
        .storage
        .presign_put(&audio_key, keys::content_type_for(&request.audio_ext))
        .await?;

    let visual = match &request.image_ext {
        Some(ext) => {
            let visual_key = keys::visual_key(tile_index, ext);
            let upload = state
                .storage
                .presign_put(&visual_key, keys::content_type_for(ext))
                .await?;
            Some(UploadSlot {
                key: upload.key,
                url: upload.url,
            })
        }
        None => None,
    };

    tracing::info!(
        profile_id = %auth.profile.id,
        tile_index,
        "Upload slots presigned"
    );

    Ok(Json(PresignResponse {
        tile_index,
        expires_in_secs: audio_upload.expires_in_secs,
        audio: UploadSlot {
            key: audio_upload.key,
            url: audio_upload.url,
        },
        visual,
    }))
}

/// Register the metadata row for uploaded objects
///
/// # Request
/// - Method: POST
/// - Path: /uploads/finalize
/// - Headers: Authorization (upload authorization required)
/// - Body: JSON track metadata including the reserved tile_index
///
/// # Response
/// - 201 Created: Track row inserted
/// - 400 Bad Request: Invalid metadata
/// - 403 Forbidden: Caller is not authorized to upload
/// - 409 Conflict: Tile index was claimed by a concurrent upload;
///   request a new presign and re-upload
async fn finalize(
    State(state): State<UploadsState>,
    auth: AuthorizedUser,
    Json(input): Json<CreateTrack>,
) -> ApiResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(ApiError::ValidationError("title must not be empty".to_string()));
    }
    if input.artist.trim().is_empty() {
        return Err(ApiError::ValidationError("artist must not be empty".to_string()));
    }
    if input.tile_index < 1 {
        return Err(ApiError::ValidationError(
            "tile_index must be positive".to_string(),
        ));
    }
    keys::validate_audio_ext(&input.audio_ext)
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;
    if let Some(ext) = &input.image_ext {
        keys::validate_image_ext(ext).map_err(|e| ApiError::ValidationError(e.to_string()))?;
    }

    let track = state.tracks.create(&input).await.map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ApiError::Conflict {
            resource_type: "tile index",
            id: input.tile_index.to_string(),
        },
        _ => ApiError::Database(e),
    })?;

    tracing::info!(
        profile_id = %auth.profile.id,
        track_id = %track.id,
        tile_index = track.tile_index,
        "Upload finalized"
    );

    Ok((StatusCode::CREATED, Json(track)))
}
