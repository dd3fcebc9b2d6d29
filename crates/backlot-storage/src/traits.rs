//! Storage abstraction trait
//!
//! This subsystem only ever reads artifacts: it resolves a storage key and
//! fetches the object. Writes are performed by the external pipeline runs.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Get-object access to the artifact blob store.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently; every method is a network or filesystem round trip.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download an object by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
