//! REST fetch helper for panel refresh functions.
//!
//! The dashboard's REST endpoints (decision history, positions, risk
//! metrics, backtests) are external collaborators; their JSON bodies are
//! opaque here. This client is the building block panels use for the
//! refresh functions they register with the fallback coordinator.

use crate::error::{SyncError, SyncResult};
use ginie_fallback::{FetchFn, FetchFuture};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// REST endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL of the dashboard API, e.g. `https://bot.example.com/api`.
    #[serde(default)]
    pub base_url: String,
    /// Bearer token attached to every request.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Client for the dashboard REST endpoints.
pub struct RestClient {
    client: Client,
    config: RestConfig,
}

impl RestClient {
    /// Create a new REST client.
    pub fn new(config: RestConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SyncError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a JSON body. Non-2xx responses become `SyncError::Http`.
    pub async fn get_json(&self, path: &str) -> SyncResult<serde_json::Value> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::HttpClient(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::HttpClient(format!("Failed to parse response: {e}")))
    }

    /// POST a JSON body and return the JSON response.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> SyncResult<serde_json::Value> {
        let url = self.endpoint(path);
        debug!(%url, "POST");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::HttpClient(format!("POST {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::HttpClient(format!("Failed to parse response: {e}")))
    }

    /// Build a coordinator-ready refresh function that GETs `path` and
    /// discards the body (the real consumer handles fresh data through its
    /// own channel; the fallback call only needs success/failure).
    pub fn refresh_fn(self: &Arc<Self>, path: &str) -> FetchFn {
        let client = self.clone();
        let path = path.to_string();
        Arc::new(move || {
            let client = client.clone();
            let path = path.clone();
            Box::pin(async move {
                client.get_json(&path).await.map(|_| ()).map_err(Into::into)
            }) as FetchFuture
        })
    }
}
