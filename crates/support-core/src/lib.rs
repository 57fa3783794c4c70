//! Core types and traits for the support chat pipeline.
//!
//! This crate provides the shared vocabulary for all pipeline components:
//!
//! - [`RequestContext`] - Per-request ephemeral context (customer id, correlation id)
//! - [`ChatSessionContext`] - Per-customer conversational state
//! - [`GuardResult`] / [`TranslationResult`] / [`LanguageDetectionResult`] - Component outputs
//! - [`SafetyGate`] / [`Translator`] / [`ReasoningEngine`] - The traits each stage is
//!   invoked through, so the orchestrator stays testable without network or clock
//! - [`detect_language`] - The Hebrew/English detection heuristic
//!
//! # Example
//!
//! ```rust
//! use support_core::{detect_language, Language};
//!
//! let detection = detect_language("What is my account balance?");
//! assert_eq!(detection.language, Language::English);
//! assert!(detection.confidence >= 0.9);
//! ```

mod detect;
mod error;
mod guard;
mod language;
mod mask;
mod reasoner;
mod request;
mod session;
mod translate;

pub use detect::{detect_language, LanguageDetectionResult};
pub use error::CoreError;
pub use guard::{GuardResult, SafetyGate};
pub use language::Language;
pub use mask::mask_customer_id;
pub use reasoner::{ClarificationRequest, DraftResponse, ReasoningEngine, ResponseTable};
pub use request::RequestContext;
pub use session::{
    ChatSessionContext, ClarificationState, ConversationSummary, ResolvedIntent,
    SelectedEntities, SessionDefaults, TimeRange, MAX_CONVERSATION_SUMMARIES,
};
pub use translate::{TranslationResult, Translator};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
