// src/generation/gemini.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use url::Url;

use super::client::{GenerationClient, GenerationOptions, RawCompletion};
use crate::{
    config::{GeminiConfig, with_trailing_slash},
    error::AppError,
};

/// Google Generative Language API client.
///
/// The decoded response envelope is returned untouched as
/// `RawCompletion::Structured`; finding the text inside it is the
/// normalizer's job.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: Url,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, client: Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: with_trailing_slash(config.base_url.clone()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn endpoint(&self) -> Result<Url, AppError> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| AppError::Generation(format!("Invalid Gemini endpoint: {}", e)))
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<RawCompletion, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Generation("GEMINI_API_KEY is not configured".to_string())
        })?;

        let payload = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_output_tokens,
            }
        });

        let res = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Gemini request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Gemini API error {}: {}",
                status, text
            )));
        }

        let body: Value = res
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Gemini response is not JSON: {}", e)))?;

        tracing::debug!("Gemini response received for model {}", self.model);

        Ok(RawCompletion::from(body))
    }
}
