//! Read-only HTTP client for the sentinel hub API
//!
//! Three query operations, one best-effort request each. Retry and backoff
//! policy lives in the pollers, not here. The base URL and request timeout
//! are injected at construction so tests can point the client at a mock hub.

use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::{MetricRecord, ServerRecord, ServiceStatusRecord};

/// Result type alias for hub queries
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by hub queries
///
/// This is the only error kind the rest of the crate sees; liveness and
/// series projection are total functions and never fail.
#[derive(Debug)]
pub enum ClientError {
    /// Request never produced a response (connect failure, timeout)
    Request(reqwest::Error),

    /// The hub answered with a non-2xx status
    Status(reqwest::StatusCode),

    /// The response body was not the expected record array
    Decode(reqwest::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Request(err) => write!(f, "request to hub failed: {err}"),
            ClientError::Status(status) => write!(f, "hub returned HTTP {status}"),
            ClientError::Decode(err) => write!(f, "failed to decode hub response: {err}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) | ClientError::Decode(err) => Some(err),
            ClientError::Status(_) => None,
        }
    }
}

/// Client for the hub's unauthenticated read endpoints
#[derive(Debug, Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MonitorClient {
    /// Create a client for the hub at `base_url`
    ///
    /// The timeout bounds every request; keep it below the poll interval so a
    /// hung fetch cannot stack onto the next tick.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /servers` - heartbeat records for every known fleet member
    pub async fn list_servers(&self) -> ClientResult<Vec<ServerRecord>> {
        self.get_records("/servers".to_string()).await
    }

    /// `GET /metrics/{server_id}` - metric history for one server
    ///
    /// The hub returns records newest-first with mixed metric types and
    /// resources; callers reshape, this method only fetches.
    pub async fn list_metrics(&self, server_id: &str) -> ClientResult<Vec<MetricRecord>> {
        self.get_records(format!("/metrics/{server_id}")).await
    }

    /// `GET /servers/{server_id}/services` - service health codes for one server
    pub async fn list_service_status(
        &self,
        server_id: &str,
    ) -> ClientResult<Vec<ServiceStatusRecord>> {
        self.get_records(format!("/servers/{server_id}/services"))
            .await
    }

    async fn get_records<T: serde::de::DeserializeOwned>(&self, path: String) -> ClientResult<Vec<T>> {
        let url = format!("{}{path}", self.base_url);

        trace!("requesting {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ClientError::Request)?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        // An empty array is a valid "no data yet" state, not an error.
        response.json().await.map_err(ClientError::Decode)
    }
}
