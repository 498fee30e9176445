//! Assistant configuration
//!
//! Everything is read from environment variables with defaults; command
//! line flags in the binary override individual fields afterwards.

use crate::availability::DEFAULT_COOLDOWN;
use crate::dispatch::RoutingPolicy;
use crate::inference::{GenerationParameters, RetryPolicy};
use crate::math::MathEngine;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";
pub const DEFAULT_SESSION_LOG: &str = "logs/session_log.txt";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for the dispatcher and the binary
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Text-generation endpoint URL
    pub endpoint: String,
    pub api_token: Option<String>,
    pub parameters: GenerationParameters,
    pub retry: RetryPolicy,
    pub availability_cooldown: Duration,
    pub math_engine: MathEngine,
    pub policy: RoutingPolicy,
    /// Wrap math answers in a conversational phrase
    pub wrap_math: bool,
    pub session_log: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: model_endpoint(DEFAULT_MODEL),
            api_token: None,
            parameters: GenerationParameters::default(),
            retry: RetryPolicy::default(),
            availability_cooldown: DEFAULT_COOLDOWN,
            math_engine: MathEngine::default(),
            policy: RoutingPolicy::default(),
            wrap_math: false,
            session_log: PathBuf::from(DEFAULT_SESSION_LOG),
        }
    }
}

/// Hosted inference URL for a model id
pub fn model_endpoint(model: &str) -> String {
    format!("https://api-inference.huggingface.co/models/{model}")
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or empty variables
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let params = defaults.parameters;

        let endpoint = get("COPILOT_ENDPOINT").unwrap_or_else(|| {
            model_endpoint(&get("COPILOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()))
        });

        let parameters = GenerationParameters {
            max_length: parse_var(&get, "COPILOT_MAX_LENGTH", params.max_length)?,
            temperature: parse_var(&get, "COPILOT_TEMPERATURE", params.temperature)?,
            top_k: parse_var(&get, "COPILOT_TOP_K", params.top_k)?,
            top_p: parse_var(&get, "COPILOT_TOP_P", params.top_p)?,
            no_repeat_ngram_size: parse_var(
                &get,
                "COPILOT_NO_REPEAT_NGRAM_SIZE",
                params.no_repeat_ngram_size,
            )?,
        };

        let retry = RetryPolicy::new(
            parse_var(&get, "COPILOT_RETRIES", defaults.retry.retries)?,
            parse_var(&get, "COPILOT_BACKOFF_BASE", defaults.retry.backoff_base)?,
        );

        let cooldown_secs = parse_var(
            &get,
            "COPILOT_AVAILABILITY_COOLDOWN_SECS",
            defaults.availability_cooldown.as_secs(),
        )?;

        let probe = parse_bool(&get, "COPILOT_PROBE", true)?;

        Ok(Self {
            endpoint,
            api_token: get("COPILOT_API_TOKEN").or_else(|| get("HF_API_TOKEN")),
            parameters,
            retry,
            availability_cooldown: Duration::from_secs(cooldown_secs),
            math_engine: parse_var(&get, "COPILOT_MATH_ENGINE", defaults.math_engine)?,
            policy: if probe {
                RoutingPolicy::ProbeThenRoute
            } else {
                RoutingPolicy::MathFirstThenGenerate
            },
            wrap_math: parse_bool(&get, "COPILOT_WRAP_MATH", defaults.wrap_math)?,
            session_log: get("COPILOT_SESSION_LOG").map_or(defaults.session_log, PathBuf::from),
        })
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = get(var) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
