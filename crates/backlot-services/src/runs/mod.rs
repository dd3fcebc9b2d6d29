//! Run reconciliation: webhook event handling and the authoritative status
//! read-through against the external workflow system.

mod reconciler;
mod status_client;

pub use reconciler::{
    EventEnvelope, ParsedEvent, RetryPolicy, RunReconciler, RunStatusPayload,
    PIPELINE_START_EVENT, RUN_STATUS_EVENT_PREFIX,
};
pub use status_client::HttpRunStatusSource;
pub use reconciler::RunStatusSource;
