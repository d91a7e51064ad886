//! Integration tests for the storage client against a stubbed S3 endpoint

use raindrops_shared_config::StorageConfig;
use raindrops_storage_client::{keys, StorageClient};
use raindrops_test_utils::MockStorageServer;

async fn client_for(storage: &MockStorageServer) -> StorageClient {
    let config = StorageConfig::with_endpoint("test-tiles", storage.endpoint());
    StorageClient::connect_with_credentials(&config, "test", "test").await
}

#[tokio::test]
async fn delete_object_sends_request() {
    let storage = MockStorageServer::start().await;
    storage.mock_delete_success().await;
    let client = client_for(&storage).await;

    client.delete_object("tile-3/audio.mp3").await.unwrap();
    assert_eq!(storage.received_request_count().await, 1);
}

#[tokio::test]
async fn delete_best_effort_continues_past_failures() {
    let storage = MockStorageServer::start().await;
    storage.mock_delete_failure().await;
    let client = client_for(&storage).await;

    let keys = vec![
        keys::audio_key(3, "mp3"),
        keys::visual_key(3, "jpg"),
    ];
    let deleted = client.delete_best_effort(&keys).await;

    // Both deletions fail, neither aborts the loop
    assert_eq!(deleted, 0);
    assert!(storage.received_request_count().await >= 2);
}

#[tokio::test]
async fn list_tile_prefixes_returns_common_prefixes() {
    let storage = MockStorageServer::start().await;
    storage.mock_list_prefixes(&["tile-1/", "tile-7/"]).await;
    let client = client_for(&storage).await;

    let prefixes = client.list_tile_prefixes().await.unwrap();
    assert_eq!(prefixes, vec!["tile-1/".to_string(), "tile-7/".to_string()]);
}

#[tokio::test]
async fn list_objects_returns_keys_with_timestamps() {
    let storage = MockStorageServer::start().await;
    storage
        .mock_list_objects("tile-7/", &["tile-7/audio.mp3", "tile-7/visual.jpg"])
        .await;
    let client = client_for(&storage).await;

    let objects = client.list_objects("tile-7/").await.unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].key, "tile-7/audio.mp3");
    assert!(objects[0].last_modified.is_some());
}

#[tokio::test]
async fn head_bucket_succeeds_when_reachable() {
    let storage = MockStorageServer::start().await;
    storage.mock_head_bucket_success().await;
    let client = client_for(&storage).await;

    assert!(client.head_bucket().await.is_ok());
}
