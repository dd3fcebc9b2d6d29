//! Storage backend selection from configuration.

use std::sync::Arc;

use backlot_core::config::StorageConfig;

use crate::local::LocalStorage;
use crate::s3::S3Storage;
use crate::traits::{Storage, StorageError, StorageResult};

/// Build the configured storage backend.
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend.as_str() {
        "s3" => {
            let bucket = config.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_BUCKET is required for the s3 backend".to_string())
            })?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION is required for the s3 backend".to_string())
            })?;
            let storage = S3Storage::new(bucket, region, config.s3_endpoint.clone()).await?;
            Ok(Arc::new(storage))
        }
        "local" => {
            let path = config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError(
                    "LOCAL_STORAGE_PATH is required for the local backend".to_string(),
                )
            })?;
            let storage = LocalStorage::new(path).await?;
            Ok(Arc::new(storage))
        }
        other => Err(StorageError::ConfigError(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}
