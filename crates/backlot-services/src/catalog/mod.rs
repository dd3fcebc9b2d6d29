//! Catalog ingestion: the external asset catalog client and the parallel,
//! idempotent ingest service.

mod client;
mod ingest;

pub use client::{CatalogClient, CatalogSource, CATALOG_FIELDS, PAGE_SIZE};
pub use ingest::{DbIngestSink, IngestReport, IngestService, IngestSink};
