//! Batch lifecycle actions
//!
//! Thin HTTP layer over [`backlot_services::BatchService`]: capability
//! checks, request decoding, and human-readable summaries. Failures carry
//! the underlying cause string in the structured error response.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Capabilities;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

use super::ActionResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBatchRequest {
    pub guids: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionIdsRequest {
    pub collection_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchIdsRequest {
    pub batch_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartBatchesRequest {
    pub batch_ids: Vec<i32>,
    /// Dispatch without any input artifact, even when artifacts exist.
    #[serde(default)]
    pub start_from_blank: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachInputsRequest {
    pub mmif_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnstartedResponse {
    pub guids: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/batches",
    tag = "batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = ActionResponse),
        (status = 422, description = "Unresolvable GUIDs", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps, request))]
pub async fn create_new_batch(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<CreateBatchRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    let batch = state
        .batch_service
        .create_new_batch(&request.guids, &request.name, &request.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse {
            msg: format!("Created Batch {}", batch.id),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/batches/create-from-collections",
    tag = "batches",
    request_body = CollectionIdsRequest,
    responses(
        (status = 201, description = "Batch created from collection union", body = ActionResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn create_from_collections(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<CollectionIdsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    let batch = state
        .batch_service
        .create_batch_from_collections(&request.collection_ids)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse {
            msg: format!(
                "Created Batch {} from {} Collection(s)",
                batch.id,
                request.collection_ids.len()
            ),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/batches/create-per-collection",
    tag = "batches",
    request_body = CollectionIdsRequest,
    responses(
        (status = 201, description = "One batch created per collection", body = ActionResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn create_per_collection(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<CollectionIdsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    let batches = state
        .batch_service
        .create_batch_per_collection(&request.collection_ids)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse {
            msg: format!("Created {} Batch(es)", batches.len()),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/batches/duplicate",
    tag = "batches",
    request_body = BatchIdsRequest,
    responses(
        (status = 200, description = "Batches duplicated", body = ActionResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn duplicate_batches(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<BatchIdsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    for batch_id in &request.batch_ids {
        state.batch_service.duplicate_batch(*batch_id).await?;
    }
    Ok(Json(ActionResponse {
        msg: format!("Duplicated {} Batch(es)", request.batch_ids.len()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/batches/combine",
    tag = "batches",
    request_body = BatchIdsRequest,
    responses(
        (status = 200, description = "Batches combined", body = ActionResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn combine_batches(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<BatchIdsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    state
        .batch_service
        .combine_batches(&request.batch_ids)
        .await?;
    Ok(Json(ActionResponse {
        msg: format!("Combined {} Batch(es)", request.batch_ids.len()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/batches/start",
    tag = "batches",
    request_body = StartBatchesRequest,
    responses(
        (status = 200, description = "Batches dispatched", body = ActionResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 502, description = "Event bus publish failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn start_batches(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<StartBatchesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:start")?;

    for batch_id in &request.batch_ids {
        state
            .batch_service
            .start_batch(*batch_id, request.start_from_blank)
            .await?;
    }
    Ok(Json(ActionResponse {
        msg: format!("Started {} Batch(es)", request.batch_ids.len()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/batches/{id}/inputs",
    tag = "batches",
    params(("id" = i32, Path, description = "Batch id")),
    request_body = AttachInputsRequest,
    responses(
        (status = 200, description = "Input MMIFs attached", body = ActionResponse),
        (status = 422, description = "Duplicate media files across inputs", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn attach_inputs(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Path(id): Path<i32>,
    Json(request): Json<AttachInputsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:edit")?;

    let attached = state
        .batch_service
        .attach_input_mmifs(id, &request.mmif_ids)
        .await?;
    Ok(Json(ActionResponse {
        msg: format!("Attached {} input MMIF(s)", attached),
    }))
}

#[utoipa::path(
    get,
    path = "/api/batches/{id}/unstarted",
    tag = "batches",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Members not yet dispatched", body = UnstartedResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps))]
pub async fn unstarted_guids(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("batches:view")?;

    let guids = state.batch_service.unstarted_guids(id).await?;
    Ok(Json(UnstartedResponse { guids }))
}
