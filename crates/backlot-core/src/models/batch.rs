use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A named, mutable set of media files dispatched together through a
/// pipeline. Membership is mutable only through validated GUID lists or
/// lifecycle operations (duplicate/combine) that copy or union existing
/// sets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Batch {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub pipeline_id: Option<i32>,
}
