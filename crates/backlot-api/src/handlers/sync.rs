//! Catalog synchronization entry point
//!
//! Kicks off a full catalog ingest in the background and reports when it
//! started. The catalog client authenticates per trigger, so a broken
//! catalog credential surfaces in the logs, not at process boot.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use backlot_services::{CatalogClient, IngestService};

use crate::auth::Capabilities;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub started_at: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/catalog/sync",
    tag = "catalog",
    responses(
        (status = 200, description = "Ingestion started", body = SyncResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn sync_catalog(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("catalog:sync")?;

    let catalog_config = state.config.catalog.clone();
    let timeout = Duration::from_secs(state.config.http_timeout_seconds);
    let workers = state.config.ingest_workers;
    let sink = state.ingest_sink.clone();

    tokio::spawn(async move {
        match CatalogClient::new(catalog_config, timeout).await {
            Ok(client) => {
                let service = IngestService::new(Arc::new(client), sink, workers);
                match service.run().await {
                    Ok(report) => tracing::info!(
                        pages = report.pages,
                        assets_upserted = report.assets_upserted,
                        "Catalog sync finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Catalog sync failed"),
                }
            }
            Err(e) => tracing::error!(error = %e, "Catalog sync could not authenticate"),
        }
    });

    Ok(Json(SyncResponse {
        started_at: Utc::now(),
    }))
}
