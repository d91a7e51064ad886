//! Integration tests for the orphan sweep against a stubbed bucket

use std::collections::HashSet;

use chrono::{Duration, Utc};
use raindrops_shared_config::StorageConfig;
use raindrops_storage_client::StorageClient;
use raindrops_test_utils::MockStorageServer;
use raindrops_worker::jobs::orphan_sweep::run_once;
use raindrops_worker::jobs::SweepConfig;

async fn client_for(storage: &MockStorageServer) -> StorageClient {
    let config = StorageConfig::with_endpoint("test-tiles", storage.endpoint());
    StorageClient::connect_with_credentials(&config, "test", "test").await
}

fn sweep_config(dry_run: bool) -> SweepConfig {
    SweepConfig {
        grace: Duration::hours(24),
        dry_run,
    }
}

#[tokio::test]
async fn reclaims_unregistered_prefix_with_old_objects() {
    let storage = MockStorageServer::start().await;
    // tile-1 is registered; tile-7 is an orphan; misc/ is not a tile
    storage
        .mock_list_prefixes(&["tile-1/", "tile-7/", "misc/"])
        .await;
    // Mock timestamps are from 2024, far older than the grace period
    storage
        .mock_list_objects("tile-7/", &["tile-7/audio.mp3", "tile-7/visual.jpg"])
        .await;
    storage.mock_delete_success().await;

    let client = client_for(&storage).await;
    let registered: HashSet<i32> = [1].into_iter().collect();

    let summary = run_once(&client, &registered, &sweep_config(false), Utc::now())
        .await
        .unwrap();

    assert_eq!(summary.prefixes_scanned, 2);
    assert_eq!(summary.orphans_found, 1);
    assert_eq!(summary.objects_deleted, 2);
    assert_eq!(summary.skipped_recent, 0);
}

#[tokio::test]
async fn registered_prefixes_are_never_touched() {
    let storage = MockStorageServer::start().await;
    storage.mock_list_prefixes(&["tile-1/", "tile-2/"]).await;

    let client = client_for(&storage).await;
    let registered: HashSet<i32> = [1, 2].into_iter().collect();

    let summary = run_once(&client, &registered, &sweep_config(false), Utc::now())
        .await
        .unwrap();

    assert_eq!(summary.prefixes_scanned, 2);
    assert_eq!(summary.orphans_found, 0);
    assert_eq!(summary.objects_deleted, 0);
    // Only the prefix listing hit the server; no per-prefix listings or
    // deletes were issued
    assert_eq!(storage.received_request_count().await, 1);
}

#[tokio::test]
async fn dry_run_reports_without_deleting() {
    let storage = MockStorageServer::start().await;
    storage.mock_list_prefixes(&["tile-7/"]).await;
    storage
        .mock_list_objects("tile-7/", &["tile-7/audio.mp3"])
        .await;

    let client = client_for(&storage).await;
    let registered = HashSet::new();

    let summary = run_once(&client, &registered, &sweep_config(true), Utc::now())
        .await
        .unwrap();

    assert_eq!(summary.orphans_found, 1);
    assert_eq!(summary.objects_deleted, 0);
    // list prefixes + list objects, no DELETE requests
    assert_eq!(storage.received_request_count().await, 2);
}

#[tokio::test]
async fn recent_objects_survive_the_grace_period() {
    let storage = MockStorageServer::start().await;
    storage.mock_list_prefixes(&["tile-7/"]).await;
    storage
        .mock_list_objects("tile-7/", &["tile-7/audio.mp3"])
        .await;

    let client = client_for(&storage).await;
    let registered = HashSet::new();

    // Pretend the sweep runs back in 2023: the 2024 mock timestamps are
    // then in the future, i.e. newer than any cutoff
    let past_now = "2023-06-01T00:00:00Z".parse::<chrono::DateTime<Utc>>().unwrap();
    let summary = run_once(&client, &registered, &sweep_config(false), past_now)
        .await
        .unwrap();

    assert_eq!(summary.orphans_found, 0);
    assert_eq!(summary.skipped_recent, 1);
    assert_eq!(summary.objects_deleted, 0);
}
