//! External catalog API client
//!
//! The catalog exposes a paginated contents listing per workspace,
//! authenticated with an OAuth2 password-grant bearer token. The token is
//! fetched at construction and refreshed once on a 401 before the request
//! is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use backlot_core::config::CatalogConfig;
use backlot_core::models::CatalogAsset;
use backlot_core::AppError;

/// Fixed catalog page size.
pub const PAGE_SIZE: usize = 100;

/// Field projection requested from the catalog for every asset.
pub const CATALOG_FIELDS: &str = "id,name,kind,size,thumbnails,format";

/// Read access to the external asset catalog.
///
/// Both methods perform network calls and may fail with
/// [`AppError::Upstream`]; the ingest service treats a page failure as
/// fatal to that page only.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Total number of assets currently in the catalog
    async fn asset_count(&self) -> Result<usize, AppError>;

    /// Fetch one page of [`PAGE_SIZE`] assets (zero-based page index)
    async fn fetch_page(&self, page: usize) -> Result<Vec<CatalogAsset>, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ContentsPage {
    count: usize,
    #[serde(default)]
    items: Vec<CatalogAsset>,
}

pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogConfig,
    token: RwLock<String>,
}

impl CatalogClient {
    /// Construct the client and perform the initial token fetch.
    pub async fn new(config: CatalogConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build catalog client: {}", e)))?;

        let token = Self::fetch_token(&client, &config).await?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(token),
        })
    }

    async fn fetch_token(client: &reqwest::Client, config: &CatalogConfig) -> Result<String, AppError> {
        let response = client
            .post(&config.token_url)
            .basic_auth(&config.username, Some(&config.password))
            .form(&[
                ("grant_type", "password"),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Catalog token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Catalog token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid catalog token response: {}", e)))?;
        Ok(token.access_token)
    }

    /// GET a workspace-relative path, refreshing the bearer token once on 401.
    async fn get_contents(&self, query: &str) -> Result<ContentsPage, AppError> {
        let url = format!(
            "{}/workspaces/{}/contents?{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.workspace_id,
            query
        );

        let token = self.token.read().await.clone();
        let mut response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Catalog request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let fresh = Self::fetch_token(&self.client, &self.config).await?;
            *self.token.write().await = fresh.clone();
            response = self
                .client
                .get(&url)
                .bearer_auth(&fresh)
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("Catalog request failed: {}", e)))?;
        }

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Catalog returned {} for {}",
                response.status(),
                url
            )));
        }

        response
            .json::<ContentsPage>()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid catalog response: {}", e)))
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn asset_count(&self) -> Result<usize, AppError> {
        let page = self.get_contents("kind=asset&limit=1").await?;
        Ok(page.count)
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<CatalogAsset>, AppError> {
        let query = format!(
            "kind=asset&limit={}&fields={}&offset={}",
            PAGE_SIZE,
            CATALOG_FIELDS,
            page * PAGE_SIZE
        );
        let contents = self.get_contents(&query).await?;
        Ok(contents.items)
    }
}
