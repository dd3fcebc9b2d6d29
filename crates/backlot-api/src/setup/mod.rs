//! Application setup: database, services, routes, server.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;

use backlot_core::Config;
use backlot_db::{
    AssetRepository, BatchRepository, CollectionRepository, MediaFileRepository, MmifRepository,
    PipelineRepository, RunRepository,
};
use backlot_services::catalog::{DbIngestSink, IngestSink};
use backlot_services::{
    ArtifactRetriever, BatchService, HttpEventPublisher, HttpRunStatusSource, RetryPolicy,
    RunReconciler,
};

use crate::state::AppState;

/// Build the connection pool, repositories, services, and router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;
    let timeout = Duration::from_secs(config.http_timeout_seconds);

    let storage = backlot_storage::create_storage(&config.storage).await?;

    let media_files = MediaFileRepository::new(pool.clone());
    let assets = AssetRepository::new(pool.clone());
    let collections = CollectionRepository::new(pool.clone());
    let batches = BatchRepository::new(pool.clone());
    let pipelines = PipelineRepository::new(pool.clone());
    let mmifs = MmifRepository::new(pool.clone());
    let runs = RunRepository::new(pool.clone());

    let publisher = Arc::new(HttpEventPublisher::new(
        config.event_bus.endpoint.clone(),
        timeout,
    )?);
    let status_source = Arc::new(HttpRunStatusSource::new(
        config.run_status.base_url.clone(),
        timeout,
    )?);
    let retry = RetryPolicy::new(
        config.run_status.retry_max_attempts,
        Duration::from_millis(config.run_status.retry_base_delay_ms),
    );

    let reconciler = Arc::new(RunReconciler::new(
        Arc::new(runs.clone()),
        status_source,
        retry,
    ));
    let batch_service = BatchService::new(
        pool.clone(),
        batches,
        collections,
        media_files.clone(),
        pipelines,
        mmifs.clone(),
        runs.clone(),
        publisher,
    );
    let retriever = Arc::new(ArtifactRetriever::new(Arc::new(mmifs), storage));
    let ingest_sink: Arc<dyn IngestSink> =
        Arc::new(DbIngestSink::new(pool.clone(), assets, media_files));

    let state = Arc::new(AppState {
        pool,
        config: config.clone(),
        batch_service,
        reconciler,
        retriever,
        ingest_sink,
        runs,
    });

    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}
