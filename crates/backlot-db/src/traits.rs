//! Repository trait abstractions for service testing
//!
//! These traits define the minimal interface the run reconciler and the
//! artifact retriever need from repositories, allowing for easy mocking and
//! testing without database dependencies.

use anyhow::Result;
use async_trait::async_trait;

use backlot_core::models::{Mmif, Run, RunStatus};

use crate::db::mmif::MmifRepository;
use crate::db::run::RunRepository;

/// Run lookup and status mutation as needed by the run reconciler.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Get a run by its external run id
    async fn get(&self, run_id: &str) -> Result<Option<Run>>;

    /// Overwrite the mirrored status fields; returns updated row count
    async fn apply_status(&self, run_id: &str, status: &RunStatus) -> Result<u64>;
}

#[async_trait]
impl RunStore for RunRepository {
    async fn get(&self, run_id: &str) -> Result<Option<Run>> {
        RunRepository::get(self, run_id).await
    }

    async fn apply_status(&self, run_id: &str, status: &RunStatus) -> Result<u64> {
        RunRepository::apply_status(self, run_id, status).await
    }
}

/// MMIF resolution as needed by the artifact retriever.
#[async_trait]
pub trait MmifStore: Send + Sync {
    /// Fetch MMIFs by id, preserving id order
    async fn get_many(&self, ids: &[i32]) -> Result<Vec<Mmif>>;

    /// MMIFs produced by the given batches (output role)
    async fn outputs_for_batches(&self, batch_ids: &[i32]) -> Result<Vec<Mmif>>;
}

#[async_trait]
impl MmifStore for MmifRepository {
    async fn get_many(&self, ids: &[i32]) -> Result<Vec<Mmif>> {
        MmifRepository::get_many(self, ids).await
    }

    async fn outputs_for_batches(&self, batch_ids: &[i32]) -> Result<Vec<Mmif>> {
        MmifRepository::outputs_for_batches(self, batch_ids).await
    }
}
