//! HTTP client for chat completions.

use reqwest::Client;
use tracing::{debug, warn};

use support_core::CoreError;

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Tool, ToolChoice,
};
use crate::config::LlmConfig;

/// Chat completion client with bearer auth and a bounded request timeout.
///
/// One client is shared by the guard and both translation directions; the
/// timeout bounds every suspension point that touches the network.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CoreError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`LlmConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(LlmConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Build a request carrying this client's model and generation limits.
    pub fn request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: None,
            tool_choice: None,
        }
    }

    /// Build a request that forces the model to call `function`.
    pub fn forced_function_request(
        &self,
        messages: Vec<ChatMessage>,
        tool: Tool,
    ) -> ChatCompletionRequest {
        let name = tool.function.name.clone();
        let mut request = self.request(messages);
        request.tools = Some(vec![tool]);
        request.tool_choice = Some(ToolChoice::force(name));
        request
    }

    /// Make a chat completion request.
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, CoreError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(CoreError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(CoreError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CoreError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        if completion.choices.is_empty() {
            warn!("Chat completion returned no choices");
        }

        Ok(completion)
    }
}
