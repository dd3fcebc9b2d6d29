//! Parallel, idempotent catalog ingestion
//!
//! The ingest service reads the catalog size, fans the page range out across
//! a fixed worker count, and writes each page in its own transaction: every
//! asset is upserted by its catalog id, and assets whose name carries the
//! canonical prefix are linked to a media file derived from the name.
//! Re-running against an unchanged catalog produces the same rows and links.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use backlot_core::models::CatalogAsset;
use backlot_core::partition::chunks_sequential;
use backlot_core::AppError;
use backlot_db::{AssetRepository, MediaFileRepository, TransactionGuard};

use super::client::{CatalogSource, PAGE_SIZE};

/// Rolled-up result of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub pages: usize,
    pub assets_upserted: u64,
    pub workers: usize,
}

/// Destination for fetched catalog pages. One call is one transaction:
/// a failed asset aborts the whole page, committed pages stay committed.
#[async_trait]
pub trait IngestSink: Send + Sync {
    /// Write one page of assets; returns the number of upserted rows.
    async fn ingest_page(&self, page: usize, assets: Vec<CatalogAsset>) -> Result<u64>;
}

/// Database sink: upsert each asset, then link canonical assets to their
/// media file (lookup-or-create, attach idempotent).
pub struct DbIngestSink {
    pool: PgPool,
    assets: AssetRepository,
    media_files: MediaFileRepository,
}

impl DbIngestSink {
    pub fn new(pool: PgPool, assets: AssetRepository, media_files: MediaFileRepository) -> Self {
        Self {
            pool,
            assets,
            media_files,
        }
    }
}

#[async_trait]
impl IngestSink for DbIngestSink {
    async fn ingest_page(&self, page: usize, assets: Vec<CatalogAsset>) -> Result<u64> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let mut upserted = 0u64;
        for asset in &assets {
            upserted += self.assets.upsert_tx(&mut tx, asset).await?;

            if let Some(guid) = asset.canonical_guid() {
                self.media_files.get_or_create_tx(&mut tx, &guid).await?;
                self.assets
                    .attach_media_file_tx(&mut tx, &asset.id, &guid)
                    .await?;
            }
        }

        tx.commit().await?;
        tracing::info!(page, upserted, "Ingested catalog page");
        Ok(upserted)
    }
}

pub struct IngestService {
    source: Arc<dyn CatalogSource>,
    sink: Arc<dyn IngestSink>,
    workers: usize,
}

impl IngestService {
    pub fn new(source: Arc<dyn CatalogSource>, sink: Arc<dyn IngestSink>, workers: usize) -> Self {
        Self {
            source,
            sink,
            workers,
        }
    }

    /// Number of pages needed to cover `asset_count` catalog entries.
    fn page_count(asset_count: usize) -> usize {
        asset_count / PAGE_SIZE + 1
    }

    /// Run one full ingestion pass. Safe to re-trigger: upserts and
    /// lookup-or-create links are idempotent.
    pub async fn run(&self) -> Result<IngestReport, AppError> {
        let asset_count = self.source.asset_count().await?;
        let pages: Vec<usize> = (0..Self::page_count(asset_count)).collect();
        let n_pages = pages.len();
        tracing::info!(asset_count, pages = n_pages, workers = self.workers, "Starting catalog ingest");

        let mut handles = Vec::new();
        for chunk in chunks_sequential(&pages, self.workers) {
            if chunk.is_empty() {
                continue;
            }
            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            handles.push(tokio::spawn(async move {
                let mut total = 0u64;
                for page in chunk {
                    let assets = source.fetch_page(page).await?;
                    total += sink
                        .ingest_page(page, assets)
                        .await
                        .map_err(AppError::from)?;
                }
                Ok::<u64, AppError>(total)
            }));
        }

        // Await every worker before reporting, so a failed worker cannot
        // mask pages other workers have already committed.
        let mut assets_upserted = 0u64;
        let mut first_error: Option<AppError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(worker_total)) => assets_upserted += worker_total,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Ingest worker failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error
                        .get_or_insert(AppError::Internal(format!("Ingest worker panicked: {}", e)));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let report = IngestReport {
            pages: n_pages,
            assets_upserted,
            workers: self.workers,
        };
        tracing::info!(
            assets_upserted = report.assets_upserted,
            "Catalog ingest finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_covers_partial_last_page() {
        assert_eq!(IngestService::page_count(0), 1);
        assert_eq!(IngestService::page_count(99), 1);
        assert_eq!(IngestService::page_count(100), 2);
        assert_eq!(IngestService::page_count(250), 3);
    }
}
