//! Dispatch-event publishing semantics against a mocked event bus.

use backlot_core::AppError;
use backlot_services::batches::publish_start_events;
use backlot_services::test_helpers::MockEventPublisher;

fn items(n: usize) -> Vec<(String, Option<String>)> {
    (0..n)
        .map(|i| (format!("cpb-aacip-{}", i), Some(format!("mmif/{}.json", i))))
        .collect()
}

#[tokio::test]
async fn test_one_event_per_media_file_with_payload_fields() {
    let publisher = MockEventPublisher::new();
    let published = publish_start_events(
        &publisher,
        7,
        "http://slate:5000,http://whisper:5000",
        &[("cpb-aacip-1".to_string(), Some("mmif/1.json".to_string()))],
    )
    .await
    .unwrap();

    assert_eq!(published, 1);
    let events = publisher.published();
    assert_eq!(events.len(), 1);
    let (name, payload) = &events[0];
    assert_eq!(name, "pipeline");
    assert_eq!(payload["batch_id"], 7);
    assert_eq!(payload["guid"], "cpb-aacip-1");
    assert_eq!(payload["pipeline"], "http://slate:5000,http://whisper:5000");
    assert_eq!(payload["mmif_location"], "mmif/1.json");
}

#[tokio::test]
async fn test_blank_dispatch_carries_null_mmif_location() {
    let publisher = MockEventPublisher::new();
    publish_start_events(&publisher, 7, "http://slate:5000", &[("g1".to_string(), None)])
        .await
        .unwrap();

    let events = publisher.published();
    assert!(events[0].1["mmif_location"].is_null());
}

#[tokio::test]
async fn test_first_publish_failure_aborts_remaining_dispatches() {
    let publisher = MockEventPublisher::new();
    publisher.fail_from(2);

    let err = publish_start_events(&publisher, 7, "http://slate:5000", &items(5))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    // The two events accepted before the failure stay published; nothing
    // after the failure is dispatched.
    assert_eq!(publisher.published().len(), 2);
}
