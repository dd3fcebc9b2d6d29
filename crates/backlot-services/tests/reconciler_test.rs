//! Run reconciler behavior against mocked store and status source.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use backlot_core::models::{Run, RunStatus};
use backlot_core::AppError;
use backlot_services::test_helpers::{MockRunStatusSource, MockRunStore};
use backlot_services::{RetryPolicy, RunReconciler};
use backlot_services::runs::EventEnvelope;

fn pending_run(id: &str) -> Run {
    Run {
        id: id.to_string(),
        pathspec: format!("PipelineFlow/{}", id),
        batch_id: Some(1),
        media_file_guid: Some("cpb-aacip-1".to_string()),
        created_at: Utc::now(),
        finished: false,
        finished_at: None,
        successful: None,
        current_step: None,
        current_task: None,
    }
}

fn finished_status() -> RunStatus {
    RunStatus {
        finished: true,
        finished_at: Some(Utc::now()),
        successful: Some(true),
        current_step: Some("end".to_string()),
        current_task: Some("t-1".to_string()),
    }
}

fn status_envelope(run_id: &str) -> EventEnvelope {
    EventEnvelope {
        body: serde_json::json!({
            "name": "run-status.task",
            "payload": {
                "run_id": run_id,
                "flow_name": "PipelineFlow",
                "step_name": "end",
                "task_id": "t-1"
            }
        })
        .to_string(),
    }
}

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(1))
}

#[tokio::test]
async fn test_unknown_run_is_not_found_and_mutates_nothing() {
    let store = Arc::new(MockRunStore::new());
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store.clone(), source.clone(), fast_retry(3));

    let err = reconciler
        .handle_event(&status_envelope("argo-missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.applied().is_empty());
    // The read-through is never consulted for an unknown run.
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_known_run_gets_status_overwritten() {
    let store = Arc::new(MockRunStore::new());
    store.add_run(pending_run("argo-1"));
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store.clone(), source, fast_retry(3));

    let msg = reconciler
        .handle_event(&status_envelope("argo-1"))
        .await
        .unwrap();
    assert_eq!(msg, "Updated Run argo-1");

    let run = store.get_run("argo-1").unwrap();
    assert!(run.finished);
    assert!(run.finished_at.is_some());
    assert_eq!(run.successful, Some(true));
    assert_eq!(run.current_step.as_deref(), Some("end"));
    assert_eq!(run.current_task.as_deref(), Some("t-1"));
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let store = Arc::new(MockRunStore::new());
    store.add_run(pending_run("argo-1"));
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store.clone(), source, fast_retry(3));

    reconciler
        .handle_event(&status_envelope("argo-1"))
        .await
        .unwrap();
    let after_first = store.get_run("argo-1").unwrap();

    reconciler
        .handle_event(&status_envelope("argo-1"))
        .await
        .unwrap();
    let after_second = store.get_run("argo-1").unwrap();

    assert_eq!(after_first.finished, after_second.finished);
    assert_eq!(after_first.successful, after_second.successful);
    assert_eq!(after_first.current_step, after_second.current_step);
    assert_eq!(store.applied().len(), 2);
}

#[tokio::test]
async fn test_read_through_retries_until_run_data_visible() {
    let store = Arc::new(MockRunStore::new());
    store.add_run(pending_run("argo-1"));
    let source = Arc::new(MockRunStatusSource::new(finished_status()).fail_times(2));
    let reconciler = RunReconciler::new(store.clone(), source.clone(), fast_retry(3));

    reconciler
        .handle_event(&status_envelope("argo-1"))
        .await
        .unwrap();

    assert_eq!(source.calls(), 3);
    assert!(store.get_run("argo-1").unwrap().finished);
}

#[tokio::test]
async fn test_read_through_gives_up_after_max_attempts() {
    let store = Arc::new(MockRunStore::new());
    store.add_run(pending_run("argo-1"));
    let source = Arc::new(MockRunStatusSource::new(finished_status()).fail_times(5));
    let reconciler = RunReconciler::new(store.clone(), source.clone(), fast_retry(2));

    let err = reconciler
        .handle_event(&status_envelope("argo-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert_eq!(source.calls(), 2);
    assert!(store.applied().is_empty());
}

#[tokio::test]
async fn test_pipeline_start_event_is_acknowledged_without_mutation() {
    let store = Arc::new(MockRunStore::new());
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store.clone(), source.clone(), fast_retry(3));

    let envelope = EventEnvelope {
        body: serde_json::json!({"name": "pipeline"}).to_string(),
    };
    let msg = reconciler.handle_event(&envelope).await.unwrap();
    assert_eq!(msg, "Pipeline start acknowledged");
    assert!(store.applied().is_empty());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_unrecognized_event_name_is_rejected() {
    let store = Arc::new(MockRunStore::new());
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store, source, fast_retry(3));

    let envelope = EventEnvelope {
        body: serde_json::json!({"name": "totally-unknown", "payload": {}}).to_string(),
    };
    let err = reconciler.handle_event(&envelope).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_malformed_body_is_rejected_before_lookup() {
    let store = Arc::new(MockRunStore::new());
    let source = Arc::new(MockRunStatusSource::new(finished_status()));
    let reconciler = RunReconciler::new(store, source.clone(), fast_retry(3));

    let envelope = EventEnvelope {
        body: "{not json".to_string(),
    };
    let err = reconciler.handle_event(&envelope).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(source.calls(), 0);
}
