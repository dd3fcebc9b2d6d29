//! HTTP handlers

pub mod batch_actions;
pub mod downloads;
pub mod events;
pub mod health;
pub mod runs;
pub mod sync;

use serde::Serialize;
use utoipa::ToSchema;

/// Human-readable outcome of a lifecycle action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub msg: String,
}
