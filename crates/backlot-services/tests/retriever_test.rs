//! Artifact retrieval: single-file passthrough, zip bundling, and
//! aggregate failure semantics against mocked storage.

use std::io::Read;
use std::sync::Arc;

use chrono::Utc;

use backlot_core::models::Mmif;
use backlot_core::AppError;
use backlot_services::test_helpers::{MockMmifStore, MockStorage};
use backlot_services::ArtifactRetriever;

fn mmif(id: i32, guid: &str, batch_output_id: Option<i32>, location: Option<&str>) -> Mmif {
    Mmif {
        id,
        created_at: Utc::now(),
        media_file_guid: guid.to_string(),
        run_id: None,
        batch_output_id,
        location: location.map(|s| s.to_string()),
    }
}

fn retriever(mmifs: Arc<MockMmifStore>, storage: Arc<MockStorage>) -> ArtifactRetriever {
    ArtifactRetriever::new(mmifs, storage)
}

#[tokio::test]
async fn test_single_artifact_returns_raw_file() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "cpb-aacip-1", None, Some("mmif/cpb-aacip-1.json")));
    let storage = Arc::new(MockStorage::new());
    storage.add_object("mmif/cpb-aacip-1.json", b"{\"views\":[]}");

    let result = retriever(store, storage).download_mmifs(&[1]).await.unwrap();
    assert_eq!(result.filename, "cpb-aacip-1.json");
    assert_eq!(result.content_type, "application/json");
    assert_eq!(result.data, b"{\"views\":[]}");
}

#[tokio::test]
async fn test_multiple_artifacts_bundle_into_timestamped_zip() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "cpb-aacip-1", Some(7), Some("mmif/one.json")));
    store.add_mmif(mmif(2, "cpb-aacip-2", Some(7), Some("mmif/two.json")));
    let storage = Arc::new(MockStorage::new());
    storage.add_object("mmif/one.json", b"one");
    storage.add_object("mmif/two.json", b"two");

    let result = retriever(store, storage)
        .download_for_batches(&[7])
        .await
        .unwrap();
    assert!(result.filename.starts_with("mmifs-"));
    assert!(result.filename.ends_with(".zip"));
    assert_eq!(result.content_type, "application/zip");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(result.data)).unwrap();
    assert_eq!(archive.len(), 2);
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["one.json", "two.json"]);

    let mut content = String::new();
    archive
        .by_name("one.json")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "one");
}

#[tokio::test]
async fn test_partial_failure_raises_aggregate_error_not_partial_zip() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "g1", Some(7), Some("mmif/ok-1.json")));
    store.add_mmif(mmif(2, "g2", Some(7), Some("mmif/broken.json")));
    store.add_mmif(mmif(3, "g3", Some(7), Some("mmif/ok-2.json")));
    let storage = Arc::new(MockStorage::new());
    storage.add_object("mmif/ok-1.json", b"one");
    storage.add_object("mmif/ok-2.json", b"two");
    storage.fail_key("mmif/broken.json", "connection reset");

    let err = retriever(store, storage)
        .download_for_batches(&[7])
        .await
        .unwrap_err();

    match err {
        AppError::Download(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors["mmif/broken.json"].contains("connection reset"));
        }
        other => panic!("expected Download error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_location_is_a_per_item_failure() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "g1", Some(7), Some("mmif/ok.json")));
    store.add_mmif(mmif(2, "g2", Some(7), None));
    let storage = Arc::new(MockStorage::new());
    storage.add_object("mmif/ok.json", b"one");

    let err = retriever(store, storage)
        .download_for_batches(&[7])
        .await
        .unwrap_err();

    match err {
        AppError::Download(errors) => {
            assert_eq!(errors["mmif-2"], "no stored location");
        }
        other => panic!("expected Download error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_mmif_ids_are_not_found() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "g1", None, Some("mmif/ok.json")));
    let storage = Arc::new(MockStorage::new());

    let err = retriever(store, storage)
        .download_mmifs(&[1, 99])
        .await
        .unwrap_err();
    match err {
        AppError::NotFound(msg) => assert!(msg.contains("99")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batches_with_no_outputs_are_not_found() {
    let store = Arc::new(MockMmifStore::new());
    let storage = Arc::new(MockStorage::new());

    let err = retriever(store, storage)
        .download_for_batches(&[42])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_duplicate_entry_names_are_disambiguated() {
    let store = Arc::new(MockMmifStore::new());
    store.add_mmif(mmif(1, "g1", Some(7), Some("batch-a/out.json")));
    store.add_mmif(mmif(2, "g2", Some(7), Some("batch-b/out.json")));
    let storage = Arc::new(MockStorage::new());
    storage.add_object("batch-a/out.json", b"a");
    storage.add_object("batch-b/out.json", b"b");

    let result = retriever(store, storage)
        .download_for_batches(&[7])
        .await
        .unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(result.data)).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["2-out.json", "out.json"]);
}
