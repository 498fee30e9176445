//! HTTP transport for the inference endpoint
//!
//! The client talks to the endpoint only through [`HttpTransport`], so
//! retry and probing logic can be exercised against a mock.

use super::InferenceError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Outgoing POST with its own deadline
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub body: Value,
    pub timeout: Duration,
}

/// Raw endpoint answer, any status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST transport to a fixed endpoint
///
/// Implementations return `Err` only for network-layer failures; every
/// HTTP status, including errors, comes back as a [`TransportResponse`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, InferenceError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, InferenceError> {
        (**self).post(request).await
    }
}

/// Production transport over `reqwest` with bearer-token auth
pub struct ReqwestTransport {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .build()
            .map_err(|e| InferenceError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, InferenceError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .timeout(request.timeout)
            .header("content-type", "application/json")
            .json(&request.body);

        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                InferenceError::network(format!("Connection failed: {e}"))
            } else {
                InferenceError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::network(format!("Failed to read response: {e}")))?;

        Ok(TransportResponse { status, body })
    }
}
