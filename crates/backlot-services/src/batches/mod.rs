mod service;

pub use service::{publish_start_events, union_membership, BatchService};
