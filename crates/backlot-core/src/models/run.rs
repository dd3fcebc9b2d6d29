//! Pipeline run model
//!
//! A run is a single execution instance of an external processing workflow,
//! tracked locally by mirrored status fields. The primary key is the
//! external workflow system's own run id; nothing here is auto-assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Locally mirrored run record. Created with `finished = false` and
/// `successful = NULL`; mutated in place by the run reconciler as status
/// events arrive; never deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Run {
    pub id: String,
    pub pathspec: String,
    pub batch_id: Option<i32>,
    pub media_file_guid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub successful: Option<bool>,
    pub current_step: Option<String>,
    pub current_task: Option<String>,
}

/// A snapshot of a run's status as reported by the external workflow
/// system. Applied to the local [`Run`] row as a whole; replaying the same
/// snapshot is a no-op by construction (plain overwrite, no counters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub successful: Option<bool>,
    pub current_step: Option<String>,
    pub current_task: Option<String>,
}
