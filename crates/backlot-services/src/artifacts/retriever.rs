//! Artifact retrieval and bundling
//!
//! Resolves MMIF storage keys for a set of batches or artifacts, downloads
//! each into a scratch directory, and aggregates per-key failures into one
//! error. Retrieval either succeeds completely — returning the raw file for
//! a single artifact or a timestamped zip bundle for several — or reports
//! everything that failed. No partial bundle is ever returned.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use backlot_core::models::Mmif;
use backlot_core::AppError;
use backlot_db::MmifStore;
use backlot_storage::Storage;

/// A successfully retrieved artifact payload: one raw file or a zip bundle.
#[derive(Debug)]
pub struct RetrievedArtifacts {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

pub struct ArtifactRetriever {
    mmifs: Arc<dyn MmifStore>,
    storage: Arc<dyn Storage>,
}

impl ArtifactRetriever {
    pub fn new(mmifs: Arc<dyn MmifStore>, storage: Arc<dyn Storage>) -> Self {
        Self { mmifs, storage }
    }

    /// Retrieve the output artifacts produced by the given batches.
    #[tracing::instrument(skip(self))]
    pub async fn download_for_batches(
        &self,
        batch_ids: &[i32],
    ) -> Result<RetrievedArtifacts, AppError> {
        let mmifs = self.mmifs.outputs_for_batches(batch_ids).await?;
        if mmifs.is_empty() {
            return Err(AppError::NotFound(format!(
                "No MMIFs produced by batches {:?}",
                batch_ids
            )));
        }
        self.download_set(mmifs).await
    }

    /// Retrieve specific artifacts by id. Unknown ids are a not-found error.
    #[tracing::instrument(skip(self))]
    pub async fn download_mmifs(&self, mmif_ids: &[i32]) -> Result<RetrievedArtifacts, AppError> {
        let mmifs = self.mmifs.get_many(mmif_ids).await?;
        let found: BTreeSet<i32> = mmifs.iter().map(|m| m.id).collect();
        let missing: Vec<String> = mmif_ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "MMIFs not found: {}",
                missing.join(", ")
            )));
        }
        if mmifs.is_empty() {
            return Err(AppError::NotFound("No MMIFs requested".to_string()));
        }
        self.download_set(mmifs).await
    }

    /// Download every artifact into a scratch directory, then hand back the
    /// single file or a zip of all of them. Per-key failures (including a
    /// missing stored location) are collected, never fail-fast.
    async fn download_set(&self, mmifs: Vec<Mmif>) -> Result<RetrievedArtifacts, AppError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| AppError::Internal(format!("Failed to create scratch dir: {}", e)))?;

        let mut errors: BTreeMap<String, String> = BTreeMap::new();
        let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();
        let mut used_names: BTreeSet<String> = BTreeSet::new();

        for mmif in &mmifs {
            let key = match &mmif.location {
                Some(key) => key,
                None => {
                    errors.insert(format!("mmif-{}", mmif.id), "no stored location".to_string());
                    continue;
                }
            };
            match self.storage.download(key).await {
                Ok(data) => {
                    let mut name = entry_filename(key, mmif.id);
                    if !used_names.insert(name.clone()) {
                        name = format!("{}-{}", mmif.id, name);
                        used_names.insert(name.clone());
                    }
                    let path = scratch.path().join(&name);
                    tokio::fs::write(&path, &data).await.map_err(|e| {
                        AppError::Internal(format!("Failed to write scratch file: {}", e))
                    })?;
                    files.push((name, path));
                }
                Err(e) => {
                    errors.insert(key.clone(), e.to_string());
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Download(errors));
        }

        if files.len() == 1 {
            let (name, path) = files.into_iter().next().expect("one file present");
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read scratch file: {}", e)))?;
            return Ok(RetrievedArtifacts {
                filename: name,
                content_type: "application/json",
                data,
            });
        }

        let data = build_zip(&files).await?;
        let filename = format!("mmifs-{}.zip", Utc::now().format("%Y%m%d%H%M%S"));
        Ok(RetrievedArtifacts {
            filename,
            content_type: "application/zip",
            data,
        })
    }
}

/// Archive entry name for a storage key: the key's base name, falling back
/// to a synthetic name when the key has none. Path components are stripped
/// to prevent traversal on extraction.
fn entry_filename(storage_key: &str, mmif_id: i32) -> String {
    Path::new(storage_key)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("mmif-{}.json", mmif_id))
}

/// Zip every scratch file into an in-memory archive.
async fn build_zip(files: &[(String, std::path::PathBuf)]) -> Result<Vec<u8>, AppError> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut archive = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (name, path) in files {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read scratch file: {}", e)))?;
            archive
                .start_file(name, options)
                .map_err(|e| AppError::Internal(format!("Failed to add file to zip: {}", e)))?;
            archive
                .write_all(&data)
                .map_err(|e| AppError::Internal(format!("Failed to write file to zip: {}", e)))?;
        }

        archive
            .finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize zip: {}", e)))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_filename_uses_key_base_name() {
        assert_eq!(entry_filename("mmif/batch-3/cpb-aacip-1.json", 7), "cpb-aacip-1.json");
        assert_eq!(entry_filename("flat.json", 7), "flat.json");
    }

    #[test]
    fn test_entry_filename_strips_traversal_components() {
        assert_eq!(entry_filename("../../etc/passwd", 7), "passwd");
        assert_eq!(entry_filename("..", 7), "mmif-7.json");
        assert_eq!(entry_filename("", 7), "mmif-7.json");
    }
}
