mod publisher;

pub use publisher::{EventPublisher, HttpEventPublisher};
