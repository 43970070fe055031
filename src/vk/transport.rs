//! HTTP transport for the VK API.
//!
//! Thin wrapper over one long-lived `reqwest::Client`. Returns decoded JSON
//! or a typed [`VkError`]; retry policy lives in the poller, never here.

use std::time::Duration;

use super::types::VkError;
use crate::config::VkConfig;

/// JSON-over-HTTP calls used by the negotiator, poller and sender.
///
/// Implementations must be safe to share between the poll task and any
/// number of concurrent senders.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// `GET url`, decoding the body as JSON.
    async fn get(&self, url: &str) -> Result<serde_json::Value, VkError>;

    /// `POST url` with an empty body, decoding the response as JSON.
    async fn post(&self, url: &str) -> Result<serde_json::Value, VkError>;
}

// =============================================================================
// REQWEST IMPLEMENTATION
// =============================================================================

/// Production transport backed by a pooled `reqwest::Client`.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build the connection pool with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`VkError::Transport`] if the TLS backend fails to initialize.
    pub fn new(config: &VkConfig) -> Result<Self, VkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| VkError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<serde_json::Value, VkError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VkError::Transport(e.to_string()))?;
        read_json(response).await
    }

    async fn post(&self, url: &str) -> Result<serde_json::Value, VkError> {
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| VkError::Transport(e.to_string()))?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, VkError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| VkError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(VkError::Transport(format!("status {status}")));
    }

    parse_body(&body)
}

pub(crate) fn parse_body(body: &str) -> Result<serde_json::Value, VkError> {
    serde_json::from_str(body).map_err(|e| VkError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
