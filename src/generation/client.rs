use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// Sampling knobs passed with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }
}

/// Whatever a provider hands back: plain text or some JSON envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCompletion {
    Text(String),
    Structured(Value),
}

impl From<Value> for RawCompletion {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawCompletion::Text(text),
            other => RawCompletion::Structured(other),
        }
    }
}

impl From<String> for RawCompletion {
    fn from(text: String) -> Self {
        RawCompletion::Text(text)
    }
}

impl From<&str> for RawCompletion {
    fn from(text: &str) -> Self {
        RawCompletion::Text(text.to_string())
    }
}

/// A text-completion provider. Implementations report transport and provider
/// failures as `AppError::Generation`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<RawCompletion, AppError>;
}
