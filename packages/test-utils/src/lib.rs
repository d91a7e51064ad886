//! Shared test utilities for the Immortal Raindrops workspace
//!
//! This crate provides mock implementations of external services for testing
//! without network dependencies. These mocks can be used across the worker
//! and API test suites.
//!
//! # Mock Services
//!
//! - [`MockStorageServer`] - S3-compatible object storage stub for upload,
//!   deletion, and bucket-listing tests
//!
//! # Example
//!
//! ```rust,ignore
//! use raindrops_test_utils::MockStorageServer;
//!
//! #[tokio::test]
//! async fn test_with_storage() {
//!     let storage = MockStorageServer::start().await;
//!     storage.mock_delete_success().await;
//!
//!     // Point your StorageService endpoint at storage.endpoint()
//! }
//! ```

mod storage;

pub use storage::MockStorageServer;
