//! Worker error types

use thiserror::Error;

/// Errors surfaced by worker jobs
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Object storage operation failed
    #[error("object storage error: {0}")]
    Storage(#[from] raindrops_storage_client::StorageError),
}

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;
