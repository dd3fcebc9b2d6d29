use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A structured output/input artifact produced or consumed by a pipeline
/// run. The `location` storage key is NULL until the producing run
/// completes and writes its output to blob storage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Mmif {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub media_file_guid: String,
    pub run_id: Option<String>,
    pub batch_output_id: Option<i32>,
    pub location: Option<String>,
}
