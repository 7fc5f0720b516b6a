//! HTTP client for the dialogtab server.
//!
//! Speaks the two-call JSON protocol: `GET /api/tables` returns the whole
//! collection and `POST /api/tables` replaces it.

use std::time::Duration;

use serde::Deserialize;

use super::{RemoteTables, SyncError};
use crate::models::TableCollection;

/// Path of the collection endpoint.
pub const TABLES_PATH: &str = "/api/tables";
/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Timeout for the health check.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Error body returned by the server on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a dialogtab server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTablesClient {
    server_url: String,
    http: reqwest::Client,
}

impl HttpTablesClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: normalize_base_url(&server_url.into()),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// Turns a non-2xx response into `SyncError::Status`, keeping the
    /// server's `{error}` message when there is one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(SyncError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl RemoteTables for HttpTablesClient {
    async fn fetch_tables(&self) -> Result<TableCollection, SyncError> {
        let response = self
            .http
            .get(self.url(TABLES_PATH))
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<TableCollection>()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }

    async fn push_tables(&self, tables: &TableCollection) -> Result<(), SyncError> {
        let response = self
            .http
            .post(self.url(TABLES_PATH))
            .json(tables)
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

/// Returns true if the server answers its health check.
pub async fn check_server(server_url: &str) -> bool {
    let url = format!("{}{}", normalize_base_url(server_url), HEALTH_PATH);

    let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Adds a scheme to bare hosts and strips trailing slashes.
fn normalize_base_url(server_url: &str) -> String {
    let trimmed = server_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
