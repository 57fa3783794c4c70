//! Configuration for the LLM client.

use std::env;
use std::time::Duration;

use support_core::CoreError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for [`LlmClient`](crate::LlmClient).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Bounded timeout for one request.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.0),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `LLM_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `LLM_API_URL` - API URL (default: https://api.openai.com)
    /// - `LLM_MODEL` - Model name (default: gpt-4o-mini)
    /// - `LLM_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `LLM_TEMPERATURE` - Temperature (default: 0.0)
    /// - `LLM_TIMEOUT_SECS` - Request timeout in seconds (default: 15)
    pub fn from_env() -> Result<Self, CoreError> {
        let api_key = env::var("LLM_API_KEY")
            .map_err(|_| CoreError::Configuration("LLM_API_KEY not set".to_string()))?;

        let api_url =
            env::var("LLM_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let max_tokens = env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.0));

        let timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a new configuration with required fields.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the API URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
