//! Remote text generation
//!
//! [`Generator`] is the seam the dispatcher talks to. [`InferenceClient`]
//! implements it against an HTTP text-generation endpoint; a local model
//! can implement it directly and own its token history.

mod client;
mod error;
mod transport;
mod types;

pub use client::{
    InferenceClient, RetryPolicy, Sleeper, TokioSleeper, PROBE_TIMEOUT, QUERY_TIMEOUT,
};
pub use error::{InferenceError, InferenceErrorKind};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
pub use types::{extract_generated_text, GenerationParameters, InferenceRequest};

use crate::history::History;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of one generation turn
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Context to carry into the next turn
    pub history: History,
    /// Whether `text` came from the model rather than an apology
    pub ok: bool,
}

/// Common interface for text generators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a reply to `prompt`. Never fails: problems are reported as
    /// apology text with `ok == false`.
    async fn generate(&self, prompt: &str, history: &History) -> Generation;

    /// Cheap liveness signal
    async fn probe(&self) -> bool;

    /// Name for logging
    fn name(&self) -> &str;
}

#[async_trait]
impl Generator for InferenceClient {
    async fn generate(&self, prompt: &str, history: &History) -> Generation {
        let request = self.request(prompt);
        let (text, ok) = match self.try_query(&request, self.retry_policy()).await {
            Ok(text) => (text, true),
            Err(e) => (e.apology().to_string(), false),
        };
        Generation {
            history: history.with_exchange(&request.inputs, &text),
            text,
            ok,
        }
    }

    async fn probe(&self) -> bool {
        InferenceClient::probe(self).await
    }

    fn name(&self) -> &str {
        "remote-inference"
    }
}

/// Logging wrapper for generators
pub struct LoggingGenerator {
    inner: Arc<dyn Generator>,
    name: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn Generator>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl Generator for LoggingGenerator {
    async fn generate(&self, prompt: &str, history: &History) -> Generation {
        let start = std::time::Instant::now();
        let generation = self.inner.generate(prompt, history).await;
        let duration = start.elapsed();

        if generation.ok {
            tracing::info!(
                generator = %self.name,
                duration_ms = %duration.as_millis(),
                reply_chars = generation.text.chars().count(),
                history_len = generation.history.len(),
                "Generation completed"
            );
        } else {
            tracing::warn!(
                generator = %self.name,
                duration_ms = %duration.as_millis(),
                "Generation failed, replied with apology"
            );
        }

        generation
    }

    async fn probe(&self) -> bool {
        let available = self.inner.probe().await;
        tracing::info!(generator = %self.name, available, "Availability probed");
        available
    }

    fn name(&self) -> &str {
        &self.name
    }
}
