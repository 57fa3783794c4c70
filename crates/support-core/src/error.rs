//! Error types shared across pipeline components.

use thiserror::Error;

/// Errors produced by pipeline components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration problem (missing env var, invalid value).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// The external service answered but the payload was unusable.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The reasoning component failed; there is no safe default answer.
    #[error("reasoning failed: {0}")]
    ReasoningFailed(String),
}
