//! S3-compatible storage client

use std::time::Duration;

use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use raindrops_shared_config::StorageConfig;

use crate::error::{StorageError, StorageResult};

/// A presigned upload slot returned to the client
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    /// Object key the URL writes to
    pub key: String,

    /// Time-limited PUT URL
    pub url: String,

    /// Seconds until the URL expires
    pub expires_in_secs: u64,
}

/// One stored object from a bucket listing
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object key
    pub key: String,

    /// Last modification time, when the store reports one
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object storage client scoped to the tile bucket
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl StorageClient {
    /// Connect using the standard AWS credential provider chain
    pub async fn connect(config: &StorageConfig) -> Self {
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Self::from_sdk_config(&base, config)
    }

    /// Connect with explicit static credentials (tests and dev setups)
    pub async fn connect_with_credentials(
        config: &StorageConfig,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "static");
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        Self::from_sdk_config(&base, config)
    }

    fn from_sdk_config(base: &aws_config::SdkConfig, config: &StorageConfig) -> Self {
        let mut builder =
            aws_sdk_s3::config::Builder::from(base).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        }
    }

    /// The bucket this client is scoped to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Generate a presigned PUT URL for one object
    ///
    /// Signing is local; no request is sent to the store.
    pub async fn presign_put(&self, key: &str, content_type: &str) -> StorageResult<PresignedUpload> {
        let presign_config = PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(PresignedUpload {
            key: key.to_string(),
            url: request.uri().to_string(),
            expires_in_secs: self.presign_expiry.as_secs(),
        })
    }

    /// Delete a single object
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(())
    }

    /// Delete a set of objects, logging failures instead of propagating them
    ///
    /// Returns the number of successful deletions.
    pub async fn delete_best_effort(&self, keys: &[String]) -> usize {
        let mut deleted = 0;
        for key in keys {
            match self.delete_object(key).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "object deletion failed, continuing");
                }
            }
        }
        deleted
    }

    /// List top-level tile prefixes (`tile-<n>/`) in the bucket
    pub async fn list_tile_prefixes(&self) -> StorageResult<Vec<String>> {
        let mut prefixes = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .delimiter("/");
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::Request(e.to_string()))?;

            prefixes.extend(
                response
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );

            if response.is_truncated() == Some(true) {
                token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(prefixes)
    }

    /// List all objects under a key prefix
    pub async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::Request(e.to_string()))?;

            objects.extend(response.contents().iter().map(|obj| StoredObject {
                key: obj.key().unwrap_or_default().to_string(),
                last_modified: obj
                    .last_modified()
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())),
            }));

            if response.is_truncated() == Some(true) {
                token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    /// Verify the bucket is reachable (readiness probe)
    pub async fn head_bucket(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    fn test_config(endpoint: &str) -> StorageConfig {
        StorageConfig::with_endpoint("test-tiles", endpoint)
    }

    async fn test_client(endpoint: &str) -> StorageClient {
        StorageClient::connect_with_credentials(&test_config(endpoint), "test", "test").await
    }

    #[tokio::test]
    async fn presign_put_is_offline_and_carries_expiry() {
        // Signing never contacts the endpoint, so a dead address is fine
        let storage = test_client("http://localhost:1").await;
        let key = keys::audio_key(7, "mp3");

        let upload = storage.presign_put(&key, "audio/mpeg").await.unwrap();

        assert_eq!(upload.key, "tile-7/audio.mp3");
        assert_eq!(upload.expires_in_secs, 900);
        assert!(upload.url.contains("tile-7/audio.mp3"));
        assert!(upload.url.contains("X-Amz-Signature="));
        assert!(upload.url.contains("X-Amz-Expires=900"));
    }

    #[tokio::test]
    async fn presigned_urls_differ_per_key() {
        let storage = test_client("http://localhost:1").await;

        let audio = storage
            .presign_put(&keys::audio_key(1, "mp3"), "audio/mpeg")
            .await
            .unwrap();
        let visual = storage
            .presign_put(&keys::visual_key(1, "jpg"), "image/jpeg")
            .await
            .unwrap();

        assert_ne!(audio.url, visual.url);
        assert!(visual.url.contains("tile-1/visual.jpg"));
    }
}
