//! Run registration
//!
//! The external workflow system mints run ids; once a run starts it (or the
//! triggering automation) registers the run here so that status webhooks
//! can resolve it. Registration is idempotent on the run id.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use backlot_core::models::Run;
use backlot_core::AppError;

use crate::auth::Capabilities;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRunRequest {
    pub run_id: String,
    pub pathspec: String,
    #[serde(default)]
    pub batch_id: Option<i32>,
    #[serde(default)]
    pub media_file_guid: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/runs",
    tag = "runs",
    request_body = RegisterRunRequest,
    responses(
        (status = 201, description = "Run registered", body = Run),
        (status = 400, description = "Invalid run id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps, request))]
pub async fn register_run(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<RegisterRunRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("runs:create")?;

    if request.run_id.trim().is_empty() {
        return Err(HttpAppError(AppError::BadRequest(
            "run_id must not be empty".to_string(),
        )));
    }

    let run = state
        .runs
        .create(
            &request.run_id,
            &request.pathspec,
            request.batch_id,
            request.media_file_guid.as_deref(),
        )
        .await
        .map_err(HttpAppError::from)?;
    Ok((StatusCode::CREATED, Json(run)))
}
