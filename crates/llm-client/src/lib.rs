//! OpenAI-compatible chat completion client.
//!
//! The guard and translation adapters both talk to the external LLM through
//! this crate. It provides:
//!
//! - [`LlmClient`] - HTTP client with bearer auth and a bounded request timeout
//! - [`LlmConfig`] - Configuration (API URL, key, model, limits)
//! - Wire types for chat completions including tool/function-call output
//! - [`extract_json`] - Extraction of a balanced JSON object from model text

mod api_types;
mod client;
mod config;
mod json;

pub use api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, FunctionCall,
    FunctionDef, ResponseMessage, Tool, ToolCall, ToolChoice, Usage,
};
pub use client::LlmClient;
pub use config::LlmConfig;
pub use json::extract_json;
