//! Resilient client for the remote text-generation endpoint
//!
//! Network failures and 429s are retried with exponential backoff; any
//! other HTTP error fails immediately. [`InferenceClient::query`] never
//! returns an error: failures come back as apology text.

use super::transport::{HttpTransport, TransportRequest};
use super::types::{extract_generated_text, GenerationParameters, InferenceRequest};
use super::InferenceError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline for a generation request
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for an availability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const PROBE_INPUT: &str = "Hello";

/// Sleeps between retry attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How many attempts a query gets and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub retries: u32,
    pub backoff_base: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_base: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff_base: u32) -> Self {
        Self {
            retries,
            backoff_base,
        }
    }

    /// Delay after the 0-based attempt `attempt` failed: `base^attempt` seconds
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(u64::from(self.backoff_base).saturating_pow(attempt))
    }

    fn attempts(&self) -> u32 {
        // A query always gets at least one attempt
        self.retries.max(1)
    }
}

/// Client for the text-generation endpoint
pub struct InferenceClient {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    parameters: GenerationParameters,
    retry: RetryPolicy,
}

impl InferenceClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            parameters: GenerationParameters::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Build a request for `prompt` with the configured parameters.
    pub fn request(&self, prompt: &str) -> InferenceRequest {
        InferenceRequest::new(prompt.trim(), self.parameters)
    }

    /// Send `request` with the configured retry policy. Never fails; errors
    /// become apology text.
    pub async fn query(&self, request: &InferenceRequest) -> String {
        self.query_with(request, self.retry).await
    }

    /// Send `request` with an explicit retry policy. Never fails.
    pub async fn query_with(&self, request: &InferenceRequest, policy: RetryPolicy) -> String {
        match self.try_query(request, policy).await {
            Ok(text) => text,
            Err(e) => e.apology().to_string(),
        }
    }

    /// Send `request`, retrying retryable failures, and return the typed
    /// outcome of the last attempt.
    pub async fn try_query(
        &self,
        request: &InferenceRequest,
        policy: RetryPolicy,
    ) -> Result<String, InferenceError> {
        let body = serde_json::to_value(request)
            .map_err(|e| InferenceError::unexpected_shape(format!("Failed to encode request: {e}")))?;
        let transport_request = TransportRequest {
            body,
            timeout: QUERY_TIMEOUT,
        };

        let attempts = policy.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            let start = Instant::now();
            let result = self.send_once(&transport_request).await;
            let duration = start.elapsed();

            match result {
                Ok(text) => {
                    tracing::info!(
                        attempt,
                        duration_ms = %duration.as_millis(),
                        "Inference request completed"
                    );
                    return Ok(text);
                }
                Err(e) if e.kind.is_retryable() => {
                    tracing::warn!(
                        attempt,
                        max_attempts = attempts,
                        duration_ms = %duration.as_millis(),
                        status = ?e.status,
                        error = %e.message,
                        retryable = true,
                        "Inference request failed"
                    );
                    if attempt + 1 < attempts {
                        self.sleeper.sleep(policy.delay(attempt)).await;
                    }
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(
                        attempt,
                        duration_ms = %duration.as_millis(),
                        status = ?e.status,
                        error = %e.message,
                        retryable = false,
                        "Inference request failed"
                    );
                    return Err(e);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| InferenceError::network("No attempt was made"));
        let mut exhausted = InferenceError::new(
            error.kind,
            format!("Failed after {attempts} attempts: {}", error.message),
        );
        exhausted.status = error.status;
        Err(exhausted)
    }

    async fn send_once(&self, request: &TransportRequest) -> Result<String, InferenceError> {
        let response = self.transport.post(request).await?;

        if response.status == 429 {
            return Err(InferenceError::rate_limited(format!(
                "Rate limited: {}",
                response.body
            )));
        }
        if !response.is_success() {
            return Err(InferenceError::http(
                response.status,
                format!("HTTP {}: {}", response.status, response.body),
            ));
        }

        extract_generated_text(&response.body)
    }

    /// Cheap liveness check: a fixed payload, short deadline, no retries.
    /// Up iff the endpoint answers exactly 200.
    pub async fn probe(&self) -> bool {
        let request = TransportRequest {
            body: json!({ "inputs": PROBE_INPUT }),
            timeout: PROBE_TIMEOUT,
        };

        match self.transport.post(&request).await {
            Ok(response) => {
                tracing::debug!(status = response.status, "Availability probe answered");
                response.status == 200
            }
            Err(e) => {
                tracing::debug!(error = %e, "Availability probe failed");
                false
            }
        }
    }
}
