//! Mock implementations for testing
//!
//! These mocks stand in for the network, the timer and the wall clock so
//! retry, backoff and probing behaviour can be asserted exactly.

use crate::availability::Clock;
use crate::history::History;
use crate::inference::{
    Generation, Generator, HttpTransport, InferenceError, Sleeper, TransportRequest,
    TransportResponse, PROBE_TIMEOUT,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ============================================================================
// Mock Transport
// ============================================================================

/// Transport that returns queued responses and records every request.
/// An empty queue answers with a network error.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, InferenceError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: InferenceError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests sent with the probe deadline
    pub fn probe_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.timeout == PROBE_TIMEOUT)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, request: &TransportRequest) -> Result<TransportResponse, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::network("No mock response queued")))
    }
}

// ============================================================================
// Recording Sleeper
// ============================================================================

/// Sleeper that records requested delays and returns immediately
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

// ============================================================================
// Manual Clock
// ============================================================================

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Mock Generator
// ============================================================================

/// Generator with a fixed reply and switchable availability
pub struct MockGenerator {
    reply: String,
    available: Mutex<bool>,
    /// Prompts passed to `generate`
    prompts: Mutex<Vec<String>>,
    probes: Mutex<usize>,
}

impl MockGenerator {
    pub fn new(reply: impl Into<String>, available: bool) -> Self {
        Self {
            reply: reply.into(),
            available: Mutex::new(available),
            prompts: Mutex::new(Vec::new()),
            probes: Mutex::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        *self.available.lock().unwrap() = available;
    }

    pub fn probe_count(&self) -> usize {
        *self.probes.lock().unwrap()
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str, history: &History) -> Generation {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Generation {
            text: self.reply.clone(),
            history: history.with_exchange(prompt, &self.reply),
            ok: true,
        }
    }

    async fn probe(&self) -> bool {
        *self.probes.lock().unwrap() += 1;
        *self.available.lock().unwrap()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
