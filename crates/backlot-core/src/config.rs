//! Configuration module
//!
//! Environment-driven configuration for the API and services. The config is
//! built once at process start and passed explicitly into every component
//! constructor; there is no module-level engine or implicit global state.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_INGEST_WORKERS: usize = 16;
const DEFAULT_STATUS_RETRY_ATTEMPTS: u32 = 5;
const DEFAULT_STATUS_RETRY_BASE_DELAY_MS: u64 = 500;

/// External asset-catalog API settings (OAuth2 password grant).
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub token_url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub workspace_id: String,
}

/// External workflow system status API settings, including the bounded
/// retry applied when a freshly-created run's data is not yet queryable.
#[derive(Clone, Debug)]
pub struct RunStatusConfig {
    pub base_url: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

/// Event bus settings. Publishes are fire-and-forget HTTP posts to the
/// gateway; a failed publish surfaces to the enclosing operation.
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub endpoint: String,
}

/// Blob storage settings. `backend` selects "s3" or "local".
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    pub ingest_workers: usize,
    pub catalog: CatalogConfig,
    pub run_status: RunStatusConfig,
    pub event_bus: EventBusConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_port: env_parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            cors_origins: env_list("CORS_ORIGINS"),
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: env_parse_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: env_parse_or("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            http_timeout_seconds: env_parse_or("HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            ingest_workers: env_parse_or("INGEST_WORKERS", DEFAULT_INGEST_WORKERS)?,
            catalog: CatalogConfig {
                base_url: require_env("CATALOG_BASE_URL")?,
                token_url: require_env("CATALOG_TOKEN_URL")?,
                username: require_env("CATALOG_USERNAME")?,
                password: require_env("CATALOG_PASSWORD")?,
                client_id: require_env("CATALOG_CLIENT_ID")?,
                client_secret: require_env("CATALOG_CLIENT_SECRET")?,
                workspace_id: require_env("CATALOG_WORKSPACE_ID")?,
            },
            run_status: RunStatusConfig {
                base_url: require_env("RUN_STATUS_BASE_URL")?,
                retry_max_attempts: env_parse_or(
                    "RUN_STATUS_RETRY_ATTEMPTS",
                    DEFAULT_STATUS_RETRY_ATTEMPTS,
                )?,
                retry_base_delay_ms: env_parse_or(
                    "RUN_STATUS_RETRY_BASE_DELAY_MS",
                    DEFAULT_STATUS_RETRY_BASE_DELAY_MS,
                )?,
            },
            event_bus: EventBusConfig {
                endpoint: require_env("EVENT_BUS_ENDPOINT")?,
            },
            storage: StorageConfig {
                backend: env_or("STORAGE_BACKEND", "local"),
                s3_bucket: env::var("S3_BUCKET").ok(),
                s3_region: env::var("S3_REGION").ok(),
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
                local_path: env::var("LOCAL_STORAGE_PATH").ok(),
            },
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing required environment variable: {}", name))
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("Invalid value for environment variable: {}", name)),
        Err(_) => Ok(default),
    }
}
