//! Cached endpoint availability
//!
//! The dispatcher probes the generator at most once per cooldown window
//! and reuses the last answer in between.

use std::time::{Duration, Instant};

/// Default window between availability probes
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Last known availability of the generator
#[derive(Debug, Clone)]
pub struct AvailabilityState {
    available: bool,
    last_checked: Option<Instant>,
    cooldown: Duration,
}

impl Default for AvailabilityState {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl AvailabilityState {
    /// Unknown availability; the first check always probes.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            available: false,
            last_checked: None,
            cooldown,
        }
    }

    /// Whether the cached answer is missing or older than the cooldown.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.last_checked
            .is_none_or(|checked| now.saturating_duration_since(checked) >= self.cooldown)
    }

    pub fn record(&mut self, now: Instant, available: bool) {
        self.available = available;
        self.last_checked = Some(now);
    }

    /// Last probed answer, if any probe has run
    pub fn cached(&self) -> Option<bool> {
        self.last_checked.map(|_| self.available)
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
