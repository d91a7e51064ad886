//! Session repository for centralized database operations
//!
//! Sessions back the JWT auth flow: access/refresh tokens are stored as
//! SHA-256 hashes, and middleware checks `is_active` on every request so
//! logout invalidates tokens immediately.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Minimal session row used by the refresh flow
#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Repository for session database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new SessionRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session record
    pub async fn create(
        &self,
        session_id: Uuid,
        profile_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, profile_id, token_hash, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Check that a session is active and belongs to the given profile
    pub async fn is_active(&self, session_id: Uuid, profile_id: Uuid) -> Result<bool, sqlx::Error> {
        let active: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT is_active FROM sessions
            WHERE id = $1 AND profile_id = $2 AND expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(active.unwrap_or(false))
    }

    /// Find an active session by id and refresh token hash
    pub async fn find_for_refresh(
        &self,
        session_id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, profile_id, expires_at
            FROM sessions
            WHERE id = $1 AND refresh_token_hash = $2 AND is_active = true
            "#,
        )
        .bind(session_id)
        .bind(refresh_token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Rotate token hashes after a successful refresh
    pub async fn rotate_tokens(
        &self,
        session_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET token_hash = $2,
                refresh_token_hash = $3,
                last_active_at = NOW(),
                expires_at = $4
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deactivate one session (logout)
    pub async fn deactivate(&self, session_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET is_active = false WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivate every active session for a profile
    pub async fn deactivate_all(&self, profile_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false WHERE profile_id = $1 AND is_active = true",
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
