//! Vote repository implementing toggle semantics
//!
//! A vote request with the value already stored removes the row
//! (toggle-off); the opposite value updates in place; no existing row
//! inserts. The whole decision runs in one transaction with the existing
//! row locked, so two rapid taps cannot produce two rows.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{VoteStatus, VoteValue};

/// Repository for vote database operations
#[derive(Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    /// Create a new VoteRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply toggle semantics for one (profile, track) pair
    ///
    /// Returns the caller's vote after the operation together with the
    /// track's aggregate score.
    pub async fn toggle(
        &self,
        profile_id: Uuid,
        track_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteStatus, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i16> = sqlx::query_scalar(
            r#"
            SELECT value FROM votes
            WHERE profile_id = $1 AND track_id = $2
            FOR UPDATE
            "#,
        )
        .bind(profile_id)
        .bind(track_id)
        .fetch_optional(&mut *tx)
        .await?;

        let my_vote = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO votes (profile_id, track_id, value)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(profile_id)
                .bind(track_id)
                .bind(value.as_i16())
                .execute(&mut *tx)
                .await?;
                Some(value.as_i16())
            }
            Some(current) if current == value.as_i16() => {
                sqlx::query("DELETE FROM votes WHERE profile_id = $1 AND track_id = $2")
                    .bind(profile_id)
                    .bind(track_id)
                    .execute(&mut *tx)
                    .await?;
                None
            }
            Some(_) => {
                sqlx::query(
                    r#"
                    UPDATE votes
                    SET value = $3, updated_at = NOW()
                    WHERE profile_id = $1 AND track_id = $2
                    "#,
                )
                .bind(profile_id)
                .bind(track_id)
                .bind(value.as_i16())
                .execute(&mut *tx)
                .await?;
                Some(value.as_i16())
            }
        };

        let score: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(value), 0)::BIGINT FROM votes WHERE track_id = $1",
        )
        .bind(track_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VoteStatus { my_vote, score })
    }

    /// The caller's current vote on a track, if any
    pub async fn find_value(
        &self,
        profile_id: Uuid,
        track_id: Uuid,
    ) -> Result<Option<i16>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM votes WHERE profile_id = $1 AND track_id = $2")
            .bind(profile_id)
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Aggregate score for one track
    pub async fn score(&self, track_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(value), 0)::BIGINT FROM votes WHERE track_id = $1",
        )
        .bind(track_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Aggregate scores for every voted track
    pub async fn scores(&self) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT track_id, COALESCE(SUM(value), 0)::BIGINT AS score
            FROM votes
            GROUP BY track_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// All votes cast by one profile, as (track_id, value) pairs
    pub async fn votes_by_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<(Uuid, i16)>, sqlx::Error> {
        sqlx::query_as("SELECT track_id, value FROM votes WHERE profile_id = $1")
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await
    }
}
