//! Event bus publisher
//!
//! Publishes named events with JSON payloads to the event gateway that
//! drives the external pipeline system. Fire-and-forget on the bus side,
//! but a failed publish surfaces to the enclosing operation: batch start
//! treats the first failure as fatal and stops dispatching.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use backlot_core::AppError;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &str, payload: JsonValue) -> Result<(), AppError>;
}

pub struct HttpEventPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventPublisher {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build event client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: &str, payload: JsonValue) -> Result<(), AppError> {
        let url = format!("{}/{}", self.endpoint, event);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Event publish failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Event publish returned {} for event {}",
                response.status(),
                event
            )));
        }

        tracing::debug!(event, "Published event");
        Ok(())
    }
}
