//! Error types for pipeline operations.

use thiserror::Error;

/// Fatal failures the pipeline surfaces to the caller.
///
/// Admission rejections and the guard refusal are not errors; they are
/// [`ChatOutcome`](crate::ChatOutcome) variants. What remains here has no
/// safe degraded form.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The reasoning component failed; there is no safe default answer.
    #[error("reasoning failed: {0}")]
    Reasoning(String),

    /// Anything unclassified. Detail is logged, never sent to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}
