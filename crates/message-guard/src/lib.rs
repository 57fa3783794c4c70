//! LLM-backed safety gate.
//!
//! [`LlmGuard`] screens a customer message for prompt injection, malicious
//! intent, and unpermitted actions before the pipeline does anything else
//! with it. The classification comes back as a forced function call whose
//! missing fields default to safe values; on any transport or parse error
//! the guard fails open by default (configurable), because availability was
//! chosen over strictness for this gate. Every fail-open event is logged
//! with the correlation id.

mod config;
mod guard;
mod prompts;

pub use config::{CheckType, GuardConfig};
pub use guard::LlmGuard;
pub use prompts::{classification_tool, instruction_for, CLASSIFY_FUNCTION_NAME};
