//! OpenAPI documentation aggregate.

use axum::response::IntoResponse;
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Backlot API",
        description = "Media batch management and pipeline-run synchronization"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::events::receive_event,
        crate::handlers::sync::sync_catalog,
        crate::handlers::runs::register_run,
        crate::handlers::batch_actions::create_new_batch,
        crate::handlers::batch_actions::create_from_collections,
        crate::handlers::batch_actions::create_per_collection,
        crate::handlers::batch_actions::duplicate_batches,
        crate::handlers::batch_actions::combine_batches,
        crate::handlers::batch_actions::start_batches,
        crate::handlers::batch_actions::attach_inputs,
        crate::handlers::batch_actions::unstarted_guids,
        crate::handlers::downloads::download_mmifs,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::ActionResponse,
        crate::handlers::events::EventRequest,
        crate::handlers::sync::SyncResponse,
        crate::handlers::runs::RegisterRunRequest,
        crate::handlers::batch_actions::CreateBatchRequest,
        crate::handlers::batch_actions::CollectionIdsRequest,
        crate::handlers::batch_actions::BatchIdsRequest,
        crate::handlers::batch_actions::StartBatchesRequest,
        crate::handlers::batch_actions::AttachInputsRequest,
        crate::handlers::batch_actions::UnstartedResponse,
        crate::handlers::downloads::DownloadRequest,
        backlot_core::models::Batch,
        backlot_core::models::Run,
        backlot_core::models::Mmif,
    ))
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document.
pub async fn serve_openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
