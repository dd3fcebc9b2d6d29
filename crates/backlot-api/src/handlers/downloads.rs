//! MMIF artifact downloads
//!
//! Returns the raw artifact when exactly one is requested, otherwise a zip
//! bundle. Partial failures never produce a bundle; the aggregate error
//! names every failing key.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use backlot_core::AppError;

use crate::auth::Capabilities;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Either a set of batch ids (their output artifacts) or explicit MMIF ids.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DownloadRequest {
    #[serde(default)]
    pub batch_ids: Option<Vec<i32>>,
    #[serde(default)]
    pub mmif_ids: Option<Vec<i32>>,
}

#[utoipa::path(
    post,
    path = "/api/mmifs/download",
    tag = "mmifs",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Raw MMIF or zip bundle", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Nothing to download", body = ErrorResponse),
        (status = 502, description = "One or more downloads failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn download_mmifs(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<DownloadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("mmifs:download")?;

    let artifacts = match (&request.batch_ids, &request.mmif_ids) {
        (Some(batch_ids), None) if !batch_ids.is_empty() => {
            state.retriever.download_for_batches(batch_ids).await?
        }
        (None, Some(mmif_ids)) if !mmif_ids.is_empty() => {
            state.retriever.download_mmifs(mmif_ids).await?
        }
        _ => {
            return Err(HttpAppError(AppError::BadRequest(
                "Provide exactly one of batch_ids or mmif_ids (non-empty)".to_string(),
            )))
        }
    };

    let headers = [
        (header::CONTENT_TYPE, artifacts.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifacts.filename),
        ),
    ];
    Ok((headers, artifacts.data))
}
