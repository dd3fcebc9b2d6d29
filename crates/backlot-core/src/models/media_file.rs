use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A logical media item, keyed by its human-assigned canonical GUID.
///
/// The GUID is immutable once created. A media file may exist with no
/// catalog assets attached (pre-registered) or with several (duplicate
/// ingestion across asset name variants).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MediaFile {
    pub guid: String,
    pub created_at: DateTime<Utc>,
}
