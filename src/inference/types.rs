//! Wire types for the text-generation endpoint

use super::InferenceError;
use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub max_length: u32,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub no_repeat_ngram_size: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_length: 1000,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            no_repeat_ngram_size: 3,
        }
    }
}

/// Generation request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

impl InferenceRequest {
    pub fn new(inputs: impl Into<String>, parameters: GenerationParameters) -> Self {
        Self {
            inputs: inputs.into(),
            parameters,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

/// The endpoint answers with either one object or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationBody {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

/// Pull `generated_text` out of a successful response body.
pub fn extract_generated_text(body: &str) -> Result<String, InferenceError> {
    let parsed: GenerationBody = serde_json::from_str(body).map_err(|e| {
        InferenceError::unexpected_shape(format!("Failed to parse response: {e} - body: {body}"))
    })?;

    let generated = match parsed {
        GenerationBody::One(item) => item.generated_text,
        GenerationBody::Many(items) => items.into_iter().next().and_then(|i| i.generated_text),
    };

    generated.ok_or_else(|| {
        InferenceError::unexpected_shape(format!("Response has no generated_text: {body}"))
    })
}
