//! Chat completion request and response wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Definition of a callable function exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// What the function does.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

/// A tool the model may (or must) call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool type (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function specification.
    pub function: FunctionDef,
}

impl Tool {
    /// Create a function tool.
    pub fn function(def: FunctionDef) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: def,
        }
    }
}

/// Forced tool selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolChoice {
    /// Choice type (always "function").
    #[serde(rename = "type")]
    pub choice_type: String,
    /// The function to force.
    pub function: ToolChoiceFunction,
}

/// Function name inside a forced tool choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolChoiceFunction {
    /// Name of the function the model must call.
    pub name: String,
}

impl ToolChoice {
    /// Force the model to call the named function.
    pub fn force(name: impl Into<String>) -> Self {
        Self {
            choice_type: "function".to_string(),
            function: ToolChoiceFunction { name: name.into() },
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tools to make available (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Forced tool selection (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID
    pub id: String,
    /// Model used
    pub model: String,
    /// Response choices
    pub choices: Vec<Choice>,
    /// Token usage
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// The text content of the first choice, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }

    /// The first tool call of the first choice, if any.
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.choices
            .first()
            .and_then(|c| c.message.tool_calls.as_ref())
            .and_then(|calls| calls.first())
    }
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Choice index
    pub index: u32,
    /// The message
    pub message: ResponseMessage,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Response message (content is null when the model called a tool).
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role
    pub role: String,
    /// Content (may be null if tool calls)
    pub content: Option<String>,
    /// Tool calls requested by the model
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    /// Call id
    pub id: String,
    /// The function invocation
    pub function: FunctionCall,
}

/// Function name and raw JSON arguments of a tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Arguments as a JSON-encoded string
    pub arguments: String,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message
    pub message: String,
    /// Error type
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Error code
    pub code: Option<String>,
}
