//! Ingest service fan-out, roll-up, and failure propagation against a
//! mocked catalog and sink.

use std::sync::Arc;

use backlot_core::models::CatalogAsset;
use backlot_services::test_helpers::{MockCatalogSource, MockIngestSink};
use backlot_services::IngestService;

fn asset(id: &str, name: &str) -> CatalogAsset {
    CatalogAsset {
        id: id.to_string(),
        name: name.to_string(),
        size: 1024,
        kind: None,
        format: None,
        thumbnails: None,
        media_file_guid: None,
    }
}

#[tokio::test]
async fn test_ingest_sums_pages_across_workers() {
    // count = 250 -> 3 pages
    let source = Arc::new(MockCatalogSource::new(250));
    source.add_page(0, vec![asset("a1", "cpb-aacip-1.mp4"), asset("a2", "cpb-aacip-2.mp4")]);
    source.add_page(1, vec![asset("a3", "cpb-aacip-3.mp4")]);
    source.add_page(2, vec![asset("a4", "other.mov")]);
    let sink = Arc::new(MockIngestSink::new());

    let service = IngestService::new(source, sink.clone(), 16);
    let report = service.run().await.unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.workers, 16);
    assert_eq!(report.assets_upserted, 4);
    assert_eq!(sink.ingested().len(), 3);
}

#[tokio::test]
async fn test_ingest_rerun_is_idempotent_at_the_report_level() {
    let source = Arc::new(MockCatalogSource::new(50));
    source.add_page(0, vec![asset("a1", "cpb-aacip-1.mp4")]);
    let sink = Arc::new(MockIngestSink::new());
    let service = IngestService::new(source, sink, 4);

    let first = service.run().await.unwrap();
    let second = service.run().await.unwrap();
    assert_eq!(first.assets_upserted, second.assets_upserted);
    assert_eq!(first.pages, second.pages);
}

#[tokio::test]
async fn test_page_fetch_failure_propagates_without_masking_other_pages() {
    let source = Arc::new(MockCatalogSource::new(250));
    source.add_page(0, vec![asset("a1", "cpb-aacip-1.mp4")]);
    source.add_page(1, vec![asset("a2", "cpb-aacip-2.mp4")]);
    source.add_page(2, vec![asset("a3", "cpb-aacip-3.mp4")]);
    source.fail_page(1);
    let sink = Arc::new(MockIngestSink::new());

    // Single worker so pages run in order: page 0 commits, page 1 aborts.
    let service = IngestService::new(source, sink.clone(), 1);
    let err = service.run().await.unwrap_err();
    assert!(err.to_string().contains("page 1"));

    let ingested = sink.ingested();
    assert!(ingested.contains_key(&0), "committed page must survive");
    assert!(!ingested.contains_key(&1));
}

#[tokio::test]
async fn test_sink_failure_aborts_only_that_worker() {
    let source = Arc::new(MockCatalogSource::new(150));
    source.add_page(0, vec![asset("a1", "cpb-aacip-1.mp4")]);
    source.add_page(1, vec![asset("a2", "cpb-aacip-2.mp4")]);
    let sink = Arc::new(MockIngestSink::new());
    sink.fail_page(0);

    // Two workers, one page each: worker 0 fails, worker 1 still commits.
    let service = IngestService::new(source, sink.clone(), 2);
    assert!(service.run().await.is_err());
    assert!(sink.ingested().contains_key(&1));
}
