//! Error types for the storage client

use thiserror::Error;

/// Errors that can occur when talking to object storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Presigned URL generation failed (invalid expiry or signing config)
    #[error("presigning failed: {0}")]
    Presign(String),

    /// A storage API request failed
    #[error("storage request failed: {0}")]
    Request(String),

    /// A file extension outside the supported set was supplied
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
