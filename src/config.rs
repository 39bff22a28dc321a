// src/config.rs

use std::{env, str::FromStr};

use dotenvy::dotenv;
use url::Url;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub port: u16,
    pub gemini: GeminiConfig,
}

/// Settings for the generation provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Absent keys are tolerated at startup; every call then fails.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: Url::parse(DEFAULT_GEMINI_BASE_URL).expect("default base url is valid"),
            temperature: 0.2,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let defaults = GeminiConfig::default();

        let base_url = match env::var("GEMINI_BASE_URL") {
            Ok(raw) => Url::parse(&raw).map(with_trailing_slash).unwrap_or_else(|e| {
                panic!("GEMINI_BASE_URL is not a valid URL ({}): {}", raw, e)
            }),
            Err(_) => defaults.base_url,
        };

        let gemini = GeminiConfig {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url,
            temperature: parse_or("GENERATION_TEMPERATURE", defaults.temperature),
            max_output_tokens: parse_or("GENERATION_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
            timeout_secs: parse_or("GENERATION_TIMEOUT_SECS", defaults.timeout_secs),
        };

        Self {
            database_url,
            rust_log,
            port: parse_or("PORT", 5000),
            gemini,
        }
    }
}

/// Makes `url` usable as a base for `Url::join`, which otherwise replaces the
/// last path segment.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Reads an optional numeric variable, falling back when unset or unparsable.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_path_is_kept_when_joined() {
        let base = with_trailing_slash(Url::parse("https://proxy.internal/gemini").unwrap());
        let joined = base.join("v1beta/models/m:generateContent").unwrap();
        assert_eq!(joined.as_str(), "https://proxy.internal/gemini/v1beta/models/m:generateContent");
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let base = with_trailing_slash(Url::parse("https://host/api/").unwrap());
        assert_eq!(base.as_str(), "https://host/api/");

        let root = with_trailing_slash(Url::parse("https://host").unwrap());
        assert_eq!(root.as_str(), "https://host/");
    }
}
