//! Profile repository for centralized database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

/// Columns selected for every profile query
const PROFILE_COLUMNS: &str = "id, username, email, password_hash, is_godmode, \
     is_authorized, last_seen_at, created_at, updated_at";

/// Repository for profile database operations
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new ProfileRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a profile by its unique ID
    pub async fn find_by_id(&self, profile_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        sqlx::query_as::<_, Profile>(&sql)
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find a profile by email (lowercased at the call site)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, sqlx::Error> {
        let sql = format!("SELECT {} FROM profiles WHERE email = $1", PROFILE_COLUMNS);
        sqlx::query_as::<_, Profile>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// List all profiles, newest first (admin view)
    pub async fn list_all(&self) -> Result<Vec<Profile>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .fetch_all(&self.pool)
            .await
    }

    /// Toggle privilege flags; absent fields are unchanged
    pub async fn set_flags(
        &self,
        profile_id: Uuid,
        is_godmode: Option<bool>,
        is_authorized: Option<bool>,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE profiles
            SET is_godmode = COALESCE($2, is_godmode),
                is_authorized = COALESCE($3, is_authorized),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, Profile>(&sql)
            .bind(profile_id)
            .bind(is_godmode)
            .bind(is_authorized)
            .fetch_optional(&self.pool)
            .await
    }

    /// Record activity on a profile
    pub async fn touch_last_seen(&self, profile_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE profiles SET last_seen_at = NOW() WHERE id = $1")
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get total count of profiles
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
    }
}
