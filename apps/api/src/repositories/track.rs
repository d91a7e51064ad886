//! Track repository for centralized database operations
//!
//! This module provides all track-related database operations in a single
//! location, following the repository pattern.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateTrack, Track, UpdateTrack};

/// Columns selected for every track query
const TRACK_COLUMNS: &str = "id, title, artist, genre, media_type, tile_index, \
     audio_ext, image_ext, duration_secs, released_on, created_at, updated_at";

/// Repository for track database operations
#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    /// Create a new TrackRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a track by its unique ID
    pub async fn find_by_id(&self, track_id: Uuid) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!("SELECT {} FROM tracks WHERE id = $1", TRACK_COLUMNS);
        sqlx::query_as::<_, Track>(&sql)
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find all tracks ordered by tile index ascending (the grid order)
    pub async fn find_all_ordered(&self) -> Result<Vec<Track>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tracks ORDER BY tile_index ASC",
            TRACK_COLUMNS
        );
        sqlx::query_as::<_, Track>(&sql).fetch_all(&self.pool).await
    }

    /// Compute the next free tile index (max + 1, starting at 1)
    ///
    /// Advisory only: the UNIQUE constraint on tile_index is what actually
    /// arbitrates concurrent allocations.
    pub async fn next_tile_index(&self) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(MAX(tile_index), 0) + 1 FROM tracks")
            .fetch_one(&self.pool)
            .await
    }

    /// All registered tile indexes (used by the orphan sweep)
    pub async fn tile_indexes(&self) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT tile_index FROM tracks ORDER BY tile_index")
            .fetch_all(&self.pool)
            .await
    }

    /// Insert a track row for a finalized upload
    ///
    /// Fails with a unique violation if the tile index was taken by a
    /// concurrent upload; callers map that to a conflict response.
    pub async fn create(&self, input: &CreateTrack) -> Result<Track, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO tracks (title, artist, genre, media_type, tile_index,
                                audio_ext, image_ext, duration_secs, released_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TRACK_COLUMNS
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(&input.genre)
            .bind(input.media_type)
            .bind(input.tile_index)
            .bind(&input.audio_ext)
            .bind(&input.image_ext)
            .bind(input.duration_secs)
            .bind(input.released_on)
            .fetch_one(&self.pool)
            .await
    }

    /// Apply a partial metadata update, returning the updated row
    pub async fn update(
        &self,
        track_id: Uuid,
        input: &UpdateTrack,
    ) -> Result<Option<Track>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tracks
            SET title = COALESCE($2, title),
                artist = COALESCE($3, artist),
                genre = COALESCE($4, genre),
                released_on = COALESCE($5, released_on),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRACK_COLUMNS
        );
        sqlx::query_as::<_, Track>(&sql)
            .bind(track_id)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(&input.genre)
            .bind(input.released_on)
            .fetch_optional(&self.pool)
            .await
    }

    /// Delete a track row (votes cascade)
    pub async fn delete(&self, track_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = $1")
            .bind(track_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get total count of tracks
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await
    }
}
