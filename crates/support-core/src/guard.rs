//! Safety-guard contract and result type.

use async_trait::async_trait;

use crate::error::CoreError;

/// Output of one guard evaluation. Consumed once per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardResult {
    /// Overall safety verdict.
    pub is_safe: bool,
    /// Prompt-injection detected.
    pub prompt_injection: bool,
    /// Malicious intent detected.
    pub malicious_intent: bool,
    /// The message asks for an action the customer is not permitted to take.
    pub unpermitted_action: bool,
    /// Risk score in [0, 1].
    pub risk_score: f64,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// Reason for rejection, when unsafe. Logged, never returned to the caller.
    pub reason: Option<String>,
}

impl GuardResult {
    /// The safe default: every missing or unparseable field resolves to this.
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            prompt_injection: false,
            malicious_intent: false,
            unpermitted_action: false,
            risk_score: 0.0,
            confidence: 0.0,
            reason: None,
        }
    }
}

impl Default for GuardResult {
    fn default() -> Self {
        Self::safe()
    }
}

/// Safety classification of a message before further processing.
#[async_trait]
pub trait SafetyGate: Send + Sync {
    /// Classify a message in its original language.
    ///
    /// Implementations must not fail the request for transport or parse
    /// errors; the documented failure policy (fail-open by default) applies
    /// and the degraded result is returned instead.
    async fn validate(&self, text: &str, correlation_id: &str) -> Result<GuardResult, CoreError>;
}
