//! Orphaned tile-object sweep
//!
//! The upload flow writes objects to storage before the metadata row
//! exists; a client that never calls finalize leaves orphaned objects
//! under an unregistered `tile-<n>/` prefix. This job diffs the bucket's
//! tile prefixes against the registered tile indexes and reclaims
//! prefixes whose objects are all older than a grace period. The grace
//! period keeps in-flight uploads (presigned but not yet finalized) safe.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use raindrops_storage_client::{keys, StorageClient, StoredObject};
use sqlx::PgPool;

use crate::error::WorkerResult;

/// Sweep parameters
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Minimum object age before an unregistered prefix is reclaimed
    pub grace: Duration,

    /// Report orphans without deleting anything
    pub dry_run: bool,
}

/// Outcome of one sweep pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Tile prefixes seen in the bucket
    pub prefixes_scanned: usize,

    /// Unregistered prefixes old enough to reclaim
    pub orphans_found: usize,

    /// Objects actually deleted (zero in dry-run mode)
    pub objects_deleted: usize,

    /// Unregistered prefixes left alone because an object is newer than
    /// the grace period
    pub skipped_recent: usize,
}

/// Run one sweep against the live database and bucket
pub async fn run(
    pool: &PgPool,
    storage: &StorageClient,
    config: &SweepConfig,
) -> WorkerResult<SweepSummary> {
    let indexes: Vec<i32> = sqlx::query_scalar("SELECT tile_index FROM tracks")
        .fetch_all(pool)
        .await?;
    let registered: HashSet<i32> = indexes.into_iter().collect();

    let summary = run_once(storage, &registered, config, Utc::now()).await?;

    tracing::info!(
        prefixes_scanned = summary.prefixes_scanned,
        orphans_found = summary.orphans_found,
        objects_deleted = summary.objects_deleted,
        skipped_recent = summary.skipped_recent,
        dry_run = config.dry_run,
        "Orphan sweep completed"
    );

    Ok(summary)
}

/// Sweep the bucket against a known set of registered tile indexes
pub async fn run_once(
    storage: &StorageClient,
    registered: &HashSet<i32>,
    config: &SweepConfig,
    now: DateTime<Utc>,
) -> WorkerResult<SweepSummary> {
    let mut summary = SweepSummary::default();
    let cutoff = now - config.grace;

    for prefix in storage.list_tile_prefixes().await? {
        let Some(tile_index) = keys::parse_tile_index(&prefix) else {
            tracing::debug!(prefix = %prefix, "skipping non-tile prefix");
            continue;
        };
        summary.prefixes_scanned += 1;

        if registered.contains(&tile_index) {
            continue;
        }

        let objects = storage.list_objects(&prefix).await?;
        if objects.is_empty() {
            continue;
        }

        if !is_reclaimable(&objects, cutoff) {
            tracing::debug!(
                prefix = %prefix,
                "unregistered prefix has recent objects, leaving for next sweep"
            );
            summary.skipped_recent += 1;
            continue;
        }

        summary.orphans_found += 1;

        if config.dry_run {
            tracing::info!(
                prefix = %prefix,
                objects = objects.len(),
                "dry run: would reclaim orphaned tile prefix"
            );
            continue;
        }

        let object_keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
        let deleted = storage.delete_best_effort(&object_keys).await;
        summary.objects_deleted += deleted;

        tracing::info!(
            prefix = %prefix,
            deleted,
            "reclaimed orphaned tile prefix"
        );
    }

    Ok(summary)
}

/// A prefix is reclaimable only when every object is older than the
/// cutoff; objects without a timestamp are treated as recent.
fn is_reclaimable(objects: &[StoredObject], cutoff: DateTime<Utc>) -> bool {
    objects.iter().all(|object| match object.last_modified {
        Some(modified) => modified < cutoff,
        None => false,
    })
}
