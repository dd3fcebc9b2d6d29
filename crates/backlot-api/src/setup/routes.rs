//! Route configuration and setup.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use backlot_core::Config;

use crate::handlers;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(config)?;

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/openapi.json", get(crate::api_doc::serve_openapi))
        .route("/api/event", post(handlers::events::receive_event))
        .route("/api/catalog/sync", post(handlers::sync::sync_catalog))
        .route("/api/runs", post(handlers::runs::register_run))
        .route("/api/batches", post(handlers::batch_actions::create_new_batch))
        .route(
            "/api/batches/create-from-collections",
            post(handlers::batch_actions::create_from_collections),
        )
        .route(
            "/api/batches/create-per-collection",
            post(handlers::batch_actions::create_per_collection),
        )
        .route(
            "/api/batches/duplicate",
            post(handlers::batch_actions::duplicate_batches),
        )
        .route(
            "/api/batches/combine",
            post(handlers::batch_actions::combine_batches),
        )
        .route(
            "/api/batches/start",
            post(handlers::batch_actions::start_batches),
        )
        .route(
            "/api/batches/{id}/inputs",
            post(handlers::batch_actions::attach_inputs),
        )
        .route(
            "/api/batches/{id}/unstarted",
            get(handlers::batch_actions::unstarted_guids),
        )
        .route("/api/mmifs/download", post(handlers::downloads::download_mmifs))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    if config.cors_origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<Result<_>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
