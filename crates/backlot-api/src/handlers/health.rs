use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
