//! Mock external collaborators: catalog, workflow status source, event bus.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use backlot_core::models::{CatalogAsset, RunStatus};
use backlot_core::AppError;

use crate::catalog::{CatalogSource, IngestSink};
use crate::events::EventPublisher;
use crate::runs::RunStatusSource;

/// Mock catalog: a fixed asset count and per-page asset lists. Pages not
/// present are empty; pages in `fail_pages` error like a network failure.
#[derive(Default)]
pub struct MockCatalogSource {
    pub count: usize,
    pages: Mutex<BTreeMap<usize, Vec<CatalogAsset>>>,
    fail_pages: Mutex<BTreeSet<usize>>,
}

impl MockCatalogSource {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn add_page(&self, page: usize, assets: Vec<CatalogAsset>) {
        self.pages.lock().unwrap().insert(page, assets);
    }

    pub fn fail_page(&self, page: usize) {
        self.fail_pages.lock().unwrap().insert(page);
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn asset_count(&self) -> Result<usize, AppError> {
        Ok(self.count)
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<CatalogAsset>, AppError> {
        if self.fail_pages.lock().unwrap().contains(&page) {
            return Err(AppError::Upstream(format!(
                "Catalog request failed for page {}",
                page
            )));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or_default())
    }
}

/// Mock ingest sink: counts assets per page, optionally failing whole pages.
#[derive(Default)]
pub struct MockIngestSink {
    ingested: Mutex<BTreeMap<usize, u64>>,
    fail_pages: Mutex<BTreeSet<usize>>,
}

impl MockIngestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_page(&self, page: usize) {
        self.fail_pages.lock().unwrap().insert(page);
    }

    pub fn ingested(&self) -> BTreeMap<usize, u64> {
        self.ingested.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestSink for MockIngestSink {
    async fn ingest_page(&self, page: usize, assets: Vec<CatalogAsset>) -> Result<u64> {
        if self.fail_pages.lock().unwrap().contains(&page) {
            anyhow::bail!("page {} transaction aborted", page);
        }
        let count = assets.len() as u64;
        self.ingested.lock().unwrap().insert(page, count);
        Ok(count)
    }
}

/// Mock status source: fails a configured number of times before returning
/// the canned status, mimicking the run-data-not-yet-visible race.
pub struct MockRunStatusSource {
    status: RunStatus,
    fail_times: Mutex<u32>,
    calls: Mutex<u32>,
}

impl MockRunStatusSource {
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            fail_times: Mutex::new(0),
            calls: Mutex::new(0),
        }
    }

    pub fn fail_times(self, times: u32) -> Self {
        *self.fail_times.lock().unwrap() = times;
        self
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RunStatusSource for MockRunStatusSource {
    async fn fetch(&self, _flow_name: &str, run_id: &str) -> Result<RunStatus, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut remaining = self.fail_times.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(AppError::Upstream(format!(
                "Run {} data not yet available",
                run_id
            )));
        }
        Ok(self.status.clone())
    }
}

/// Mock event publisher: records successful publishes and can be set to
/// fail from the Nth publish onward.
#[derive(Default)]
pub struct MockEventPublisher {
    published: Mutex<Vec<(String, JsonValue)>>,
    fail_from: Mutex<Option<usize>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish once `n` events have been accepted.
    pub fn fail_from(&self, n: usize) {
        *self.fail_from.lock().unwrap() = Some(n);
    }

    pub fn published(&self) -> Vec<(String, JsonValue)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, event: &str, payload: JsonValue) -> Result<(), AppError> {
        let mut published = self.published.lock().unwrap();
        if let Some(n) = *self.fail_from.lock().unwrap() {
            if published.len() >= n {
                return Err(AppError::Upstream("event bus unavailable".to_string()));
            }
        }
        published.push((event.to_string(), payload));
        Ok(())
    }
}
