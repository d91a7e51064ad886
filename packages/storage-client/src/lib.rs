//! Object storage client for Immortal Raindrops tiles
//!
//! This crate wraps the S3 SDK behind the small surface the archive
//! needs: presigned PUT URLs for direct browser uploads, best-effort
//! object deletion, and bucket listing for the orphan sweep. It also owns
//! the tile key layout (`tile-<index>/audio.<ext>`,
//! `tile-<index>/visual.<ext>`), so every service derives keys the same
//! way.
//!
//! # Thread Safety
//!
//! `StorageClient` is `Clone + Send + Sync`; the inner SDK client shares
//! one connection pool.
//!
//! # Example
//!
//! ```no_run
//! use raindrops_shared_config::StorageConfig;
//! use raindrops_storage_client::{keys, StorageClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_env()?;
//! let storage = StorageClient::connect(&config).await;
//!
//! let upload = storage
//!     .presign_put(&keys::audio_key(7, "mp3"), "audio/mpeg")
//!     .await?;
//! println!("PUT to {} within {}s", upload.url, upload.expires_in_secs);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod keys;

pub use client::{PresignedUpload, StorageClient, StoredObject};
pub use error::{StorageError, StorageResult};
