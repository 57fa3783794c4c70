//! Orchestration of one customer message through admission control,
//! session state, safety screening, translation, and reasoning.
//!
//! The pipeline composes the seam traits from `support-core` and owns all
//! session mutation. Transport concerns (HTTP statuses, headers) live in
//! the binary crate; this crate's surface is [`ChatPipeline::chat`] and the
//! closed [`ChatOutcome`] set it returns.

pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod rate_limit;

pub use error::PipelineError;
pub use outcome::{refusal_text, ChatOutcome, ChatReply, REFUSAL_EN, REFUSAL_HE};
pub use pipeline::ChatPipeline;
pub use rate_limit::{RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
