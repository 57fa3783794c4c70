//! Contract for the downstream reasoning component.
//!
//! The reasoning component turns a normalized English question into a
//! structured draft answer. Its internals (intent resolution, account data
//! lookup) live behind this trait; the pipeline only sees the draft.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::request::RequestContext;
use crate::session::{ChatSessionContext, ResolvedIntent, TimeRange};

/// A named table of rows and columns inside a draft response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTable {
    /// Table name (e.g. "transactions").
    pub name: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Row values, one vector per row.
    pub rows: Vec<Vec<String>>,
}

/// A clarification the reasoning component wants to ask the customer.
///
/// The pipeline stamps the ask time and persists it into the session; the
/// question text becomes the answer of this turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationRequest {
    /// The question to ask, in English.
    pub question: String,
    /// What shape of answer is expected.
    pub expected_answer: String,
    /// What is being clarified.
    pub subject: String,
}

/// The reasoning component's structured output prior to outbound translation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftResponse {
    /// English answer text.
    pub answer: String,
    /// English explanation of how the answer was produced.
    pub explanation: String,
    /// Zero or more structured tables.
    pub tables: Vec<ResponseTable>,
    /// Clarification request, when the component needs a follow-up answer.
    pub clarification: Option<ClarificationRequest>,
    /// Intent resolved for this turn, to be persisted into the session.
    pub resolved_intent: Option<ResolvedIntent>,
    /// Absolute time range resolved for this turn.
    pub resolved_time_range: Option<TimeRange>,
}

impl DraftResponse {
    /// A plain text answer with no tables or session deltas.
    pub fn text(answer: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            explanation: explanation.into(),
            ..Default::default()
        }
    }
}

/// The downstream reasoning component, invoked as an opaque function.
///
/// There is no safe default answer, so implementations surface failures to
/// the caller instead of degrading.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Resolve a normalized English question into a draft answer.
    async fn resolve(
        &self,
        normalized_text: &str,
        request: &RequestContext,
        session: &ChatSessionContext,
    ) -> Result<DraftResponse, CoreError>;

    /// Human-readable component name for logs.
    fn name(&self) -> &str;
}
