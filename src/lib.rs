//! Co-Pilot chat - a terminal coding assistant
//!
//! Arithmetic is answered locally by a math engine; everything else is sent
//! to a remote text-generation endpoint with retry and availability caching.
//! [`dispatch::Dispatcher`] is the entry point for each turn.

pub mod availability;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod inference;
pub mod math;
pub mod session_log;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AssistantConfig, ConfigError};
pub use dispatch::{Dispatcher, Reply, Route, RoutingPolicy};
pub use history::History;
