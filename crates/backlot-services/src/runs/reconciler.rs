//! Webhook-driven run reconciliation
//!
//! Deliveries are not ordered and may repeat; the reconciler never trusts
//! payload-embedded status. It re-reads the authoritative run status from
//! the external workflow system and overwrites the local row, so replaying
//! an event is safe and out-of-order delivery degrades to last-write-wins.
//!
//! A status event for an unknown run id is a hard `NotFound`: the delivery
//! system retries later, and the handler never invents a run record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use backlot_core::models::RunStatus;
use backlot_core::AppError;
use backlot_db::RunStore;

/// Exact-match start notification. Informational only: the external system
/// has not minted a run id at publish time, so there is nothing to record.
pub const PIPELINE_START_EVENT: &str = "pipeline";

/// Name prefix of the status-event namespace.
pub const RUN_STATUS_EVENT_PREFIX: &str = "run-status";

/// Backoff is capped so high attempt counts do not produce excessive delays.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Webhook envelope: the delivery wraps a JSON-encoded body string.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct EventBody {
    name: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Payload of a run-status event. Step and task labels are logged for
/// traceability but the authoritative values come from the read-through.
#[derive(Debug, Clone, Deserialize)]
pub struct RunStatusPayload {
    pub run_id: String,
    pub flow_name: String,
    pub step_name: String,
    pub task_id: String,
}

/// A recognized webhook event.
#[derive(Debug)]
pub enum ParsedEvent {
    PipelineStart,
    RunStatus(RunStatusPayload),
}

/// Decode and validate an envelope. Malformed bodies and unrecognized event
/// names are rejected here, before any database lookup.
pub fn parse_event(envelope: &EventEnvelope) -> Result<ParsedEvent, AppError> {
    let body: EventBody = serde_json::from_str(&envelope.body)
        .map_err(|e| AppError::BadRequest(format!("Malformed event body: {}", e)))?;

    if body.name == PIPELINE_START_EVENT {
        return Ok(ParsedEvent::PipelineStart);
    }

    if body.name.starts_with(RUN_STATUS_EVENT_PREFIX) {
        let payload: RunStatusPayload = serde_json::from_value(body.payload)
            .map_err(|e| AppError::BadRequest(format!("Malformed run-status payload: {}", e)))?;
        return Ok(ParsedEvent::RunStatus(payload));
    }

    Err(AppError::BadRequest(format!(
        "Unrecognized event name: {}",
        body.name
    )))
}

/// Authoritative run status, read through to the external workflow system.
///
/// Every call is a network round trip. A freshly-created run's data may not
/// be visible yet on the external side; callers retry with
/// [`RetryPolicy`] rather than treating the first miss as fatal.
#[async_trait]
pub trait RunStatusSource: Send + Sync {
    async fn fetch(&self, flow_name: &str, run_id: &str) -> Result<RunStatus, AppError>;
}

/// Bounded retry with exponential backoff, applied at the status
/// read-through only.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (zero-based), exponential with cap.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        exp.min(MAX_RETRY_BACKOFF)
    }
}

pub struct RunReconciler {
    runs: Arc<dyn RunStore>,
    source: Arc<dyn RunStatusSource>,
    retry: RetryPolicy,
}

impl RunReconciler {
    pub fn new(runs: Arc<dyn RunStore>, source: Arc<dyn RunStatusSource>, retry: RetryPolicy) -> Self {
        Self {
            runs,
            source,
            retry,
        }
    }

    /// Process one webhook delivery. Returns a short human-readable summary
    /// on success; errors map to HTTP statuses the delivery system uses to
    /// decide on redelivery.
    #[tracing::instrument(skip(self, envelope))]
    pub async fn handle_event(&self, envelope: &EventEnvelope) -> Result<String, AppError> {
        match parse_event(envelope)? {
            ParsedEvent::PipelineStart => {
                tracing::info!("Pipeline start notification received");
                Ok("Pipeline start acknowledged".to_string())
            }
            ParsedEvent::RunStatus(payload) => self.reconcile_run(&payload).await,
        }
    }

    async fn reconcile_run(&self, payload: &RunStatusPayload) -> Result<String, AppError> {
        let run = self
            .runs
            .get(&payload.run_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Run {} not found", payload.run_id)))?;

        tracing::info!(
            run_id = %run.id,
            step = %payload.step_name,
            task = %payload.task_id,
            "Reconciling run status"
        );

        let status = self
            .fetch_with_retry(&payload.flow_name, &payload.run_id)
            .await?;

        self.runs
            .apply_status(&payload.run_id, &status)
            .await
            .map_err(AppError::from)?;

        Ok(format!("Updated Run {}", payload.run_id))
    }

    /// Read the authoritative status, retrying while the external system's
    /// own run metadata is not yet visible.
    async fn fetch_with_retry(&self, flow_name: &str, run_id: &str) -> Result<RunStatus, AppError> {
        let mut attempt = 0u32;
        loop {
            match self.source.fetch(flow_name, run_id).await {
                Ok(status) => return Ok(status),
                Err(e) if attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        run_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Run status not yet available, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: serde_json::Value) -> EventEnvelope {
        EventEnvelope {
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_pipeline_start() {
        let e = envelope(json!({"name": "pipeline"}));
        assert!(matches!(parse_event(&e), Ok(ParsedEvent::PipelineStart)));
    }

    #[test]
    fn test_parse_run_status_by_prefix() {
        let e = envelope(json!({
            "name": "run-status.step",
            "payload": {
                "run_id": "argo-123",
                "flow_name": "pipeline_flow",
                "step_name": "transcode",
                "task_id": "t-9"
            }
        }));
        match parse_event(&e) {
            Ok(ParsedEvent::RunStatus(p)) => {
                assert_eq!(p.run_id, "argo-123");
                assert_eq!(p.flow_name, "pipeline_flow");
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_name() {
        let e = envelope(json!({"name": "something-else", "payload": {}}));
        let err = parse_event(&e).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_body_before_lookup() {
        let e = EventEnvelope {
            body: "not json".to_string(),
        };
        let err = parse_event(&e).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_parse_rejects_incomplete_status_payload() {
        let e = envelope(json!({
            "name": "run-status.step",
            "payload": {"run_id": "argo-123"}
        }));
        let err = parse_event(&e).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_retry_policy_backoff_is_exponential_with_cap() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), MAX_RETRY_BACKOFF);
    }
}
