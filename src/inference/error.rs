//! Inference error types

use thiserror::Error;

/// Inference error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InferenceError {
    pub kind: InferenceErrorKind,
    pub message: String,
    /// HTTP status, when the endpoint answered
    pub status: Option<u16>,
}

impl InferenceError {
    pub fn new(kind: InferenceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Network, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::RateLimited, message).with_status(429)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::Http, message).with_status(status)
    }

    pub fn unexpected_shape(message: impl Into<String>) -> Self {
        Self::new(InferenceErrorKind::UnexpectedResponseShape, message)
    }

    /// User-facing reply for this failure
    pub fn apology(&self) -> &'static str {
        match self.kind {
            InferenceErrorKind::UnexpectedResponseShape => {
                "I'm sorry, I received an unexpected response from the language model."
            }
            InferenceErrorKind::Network
            | InferenceErrorKind::RateLimited
            | InferenceErrorKind::Http => {
                "I'm sorry, I'm having trouble reaching the language model right now. Please try again later."
            }
        }
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceErrorKind {
    /// Connection failure or timeout - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimited,
    /// Any other non-2xx status - not retryable
    Http,
    /// 2xx without the expected field - not retryable
    UnexpectedResponseShape,
}

impl InferenceErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimited)
    }
}
