//! Application state
//!
//! Built once at startup and injected into handlers via axum `State`.
//! The catalog client is constructed per sync trigger (its token fetch is a
//! network call), so the state carries the ingest sink and config instead.

use std::sync::Arc;

use sqlx::PgPool;

use backlot_core::Config;
use backlot_db::RunRepository;
use backlot_services::catalog::IngestSink;
use backlot_services::{ArtifactRetriever, BatchService, RunReconciler};

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub batch_service: BatchService,
    pub reconciler: Arc<RunReconciler>,
    pub retriever: Arc<ArtifactRetriever>,
    pub ingest_sink: Arc<dyn IngestSink>,
    pub runs: RunRepository,
}
