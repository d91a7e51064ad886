//! Settings repository for the site and system singletons
//!
//! Both rows are seeded by the initial migration, so updates are plain
//! `UPDATE ... WHERE id = 1` statements returning the new state.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{SiteSettings, SiteSettingsInput, SystemSettings, SystemSettingsInput};

/// Repository for site and system settings database operations
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new SettingsRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the site settings singleton
    pub async fn get_site(&self) -> Result<SiteSettings, sqlx::Error> {
        sqlx::query_as::<_, SiteSettings>(
            r#"
            SELECT id, is_live, stream_title, stream_url, updated_at
            FROM site_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    /// Replace the site settings, returning the new state
    pub async fn update_site(
        &self,
        input: &SiteSettingsInput,
    ) -> Result<SiteSettings, sqlx::Error> {
        sqlx::query_as::<_, SiteSettings>(
            r#"
            UPDATE site_settings
            SET is_live = $1,
                stream_title = $2,
                stream_url = $3,
                updated_at = NOW()
            WHERE id = 1
            RETURNING id, is_live, stream_title, stream_url, updated_at
            "#,
        )
        .bind(input.is_live)
        .bind(&input.stream_title)
        .bind(&input.stream_url)
        .fetch_one(&self.pool)
        .await
    }

    /// Get the system settings singleton
    pub async fn get_system(&self) -> Result<SystemSettings, sqlx::Error> {
        sqlx::query_as::<_, SystemSettings>(
            r#"
            SELECT id, maintenance_mode, announcement, updated_by, updated_at
            FROM system_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    /// Replace the system settings, recording who changed them
    pub async fn update_system(
        &self,
        input: &SystemSettingsInput,
        updated_by: Uuid,
    ) -> Result<SystemSettings, sqlx::Error> {
        sqlx::query_as::<_, SystemSettings>(
            r#"
            UPDATE system_settings
            SET maintenance_mode = $1,
                announcement = $2,
                updated_by = $3,
                updated_at = NOW()
            WHERE id = 1
            RETURNING id, maintenance_mode, announcement, updated_by, updated_at
            "#,
        )
        .bind(input.maintenance_mode)
        .bind(&input.announcement)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
    }
}
