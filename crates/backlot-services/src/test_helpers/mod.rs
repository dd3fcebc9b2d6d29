//! Mock implementations for testing services without a database, a blob
//! store, or the external workflow and event systems.

mod mock_sources;
mod mock_stores;

pub use mock_sources::{MockCatalogSource, MockEventPublisher, MockIngestSink, MockRunStatusSource};
pub use mock_stores::{MockMmifStore, MockRunStore, MockStorage};
