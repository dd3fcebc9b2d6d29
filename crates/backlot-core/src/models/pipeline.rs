use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// An ordered reference list of processing apps applied to a batch's
/// members. Purely descriptive; the app endpoints are resolved in
/// pipeline-defined order when a batch is started.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Pipeline {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// A single external processing app referenced by pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PipelineApp {
    pub id: i32,
    pub name: String,
    pub endpoint: String,
    pub description: String,
}
