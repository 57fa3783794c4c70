//! Canned reasoning component for local runs and integration testing.

use support_core::{
    async_trait, ChatSessionContext, ClarificationRequest, CoreError, DraftResponse,
    ReasoningEngine, RequestContext, ResolvedIntent, ResponseTable,
};

/// A deterministic reasoning component with a few canned behaviors.
///
/// Lets the full pipeline run without the real downstream service: balance
/// questions get a structured table, transaction questions without a stored
/// time range trigger a clarification, and everything else is echoed back.
#[derive(Debug, Clone, Default)]
pub struct FixtureReasoner;

impl FixtureReasoner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReasoningEngine for FixtureReasoner {
    async fn resolve(
        &self,
        normalized_text: &str,
        _request: &RequestContext,
        session: &ChatSessionContext,
    ) -> Result<DraftResponse, CoreError> {
        let lowered = normalized_text.to_lowercase();

        if lowered.contains("balance") {
            return Ok(DraftResponse {
                answer: "Your checking account balance is 1,234.56 USD.".to_string(),
                explanation: "Looked up the current balance of your primary account."
                    .to_string(),
                tables: vec![ResponseTable {
                    name: "balances".to_string(),
                    columns: vec!["Account".to_string(), "Balance".to_string()],
                    rows: vec![vec!["****1234".to_string(), "1,234.56 USD".to_string()]],
                }],
                resolved_intent: Some(ResolvedIntent {
                    domain: "accounts".to_string(),
                    metric: "balance".to_string(),
                    parameters: Default::default(),
                }),
                ..Default::default()
            });
        }

        if lowered.contains("transaction") && session.last_time_range.is_none() {
            return Ok(DraftResponse {
                explanation: "A time range is needed before listing transactions."
                    .to_string(),
                clarification: Some(ClarificationRequest {
                    question: "For which period would you like to see transactions?"
                        .to_string(),
                    expected_answer: "date-range".to_string(),
                    subject: "time-range".to_string(),
                }),
                ..Default::default()
            });
        }

        Ok(DraftResponse::text(
            format!("You asked: {}", normalized_text),
            "Echoed the question back; no canned behavior matched.",
        ))
    }

    fn name(&self) -> &str {
        "FixtureReasoner"
    }
}
