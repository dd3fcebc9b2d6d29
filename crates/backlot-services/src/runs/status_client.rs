//! HTTP read-through to the external workflow system's status API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use backlot_core::models::RunStatus;
use backlot_core::AppError;

use super::reconciler::RunStatusSource;

#[derive(Debug, Deserialize)]
struct RunStatusResponse {
    finished: bool,
    finished_at: Option<DateTime<Utc>>,
    successful: Option<bool>,
    current_step: Option<String>,
    current_task: Option<String>,
}

/// Fetches `GET {base}/flows/{flow_name}/runs/{run_id}` from the workflow
/// system. Every call is a network round trip; the reconciler wraps calls
/// in its retry policy, so a 404 here simply means "not visible yet".
pub struct HttpRunStatusSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRunStatusSource {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build status client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RunStatusSource for HttpRunStatusSource {
    async fn fetch(&self, flow_name: &str, run_id: &str) -> Result<RunStatus, AppError> {
        let url = format!("{}/flows/{}/runs/{}", self.base_url, flow_name, run_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Run status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Run status request returned {} for {}/{}",
                response.status(),
                flow_name,
                run_id
            )));
        }

        let status: RunStatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid run status response: {}", e)))?;

        Ok(RunStatus {
            finished: status.finished,
            finished_at: status.finished_at,
            successful: status.successful,
            current_step: status.current_step,
            current_task: status.current_task,
        })
    }
}
