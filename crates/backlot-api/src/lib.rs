//! Backlot API
//!
//! Axum application exposing the ingestion entry point, the pipeline
//! webhook endpoint, batch lifecycle actions, and artifact downloads.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
