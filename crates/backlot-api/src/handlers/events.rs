//! Pipeline webhook endpoint
//!
//! Receives event deliveries from the external workflow system. Statuses
//! map onto the delivery system's retry logic: 400 for rejected envelopes,
//! 404 when the referenced run is not yet visible locally (eligible for
//! redelivery), 502 when the authoritative status source stays unavailable.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use backlot_services::runs::EventEnvelope;

use crate::auth::Capabilities;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

use super::ActionResponse;

/// Webhook delivery envelope: a JSON-encoded body string.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EventRequest {
    pub body: String,
}

#[utoipa::path(
    post,
    path = "/api/event",
    tag = "events",
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event processed", body = ActionResponse),
        (status = 400, description = "Malformed or unrecognized event", body = ErrorResponse),
        (status = 404, description = "Referenced run not found", body = ErrorResponse),
        (status = 502, description = "Workflow status source unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caps, request))]
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    caps: Capabilities,
    Json(request): Json<EventRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    caps.require("events:create")?;

    let envelope = EventEnvelope { body: request.body };
    let msg = state
        .reconciler
        .handle_event(&envelope)
        .await
        .map_err(HttpAppError::from)?;
    Ok(Json(ActionResponse { msg }))
}
