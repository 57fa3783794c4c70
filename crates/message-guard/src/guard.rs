//! The safety gate implementation.

use serde::Deserialize;
use tracing::{debug, info, warn};

use llm_client::{extract_json, ChatMessage, LlmClient};
use support_core::{async_trait, CoreError, GuardResult, SafetyGate};

use crate::config::GuardConfig;
use crate::prompts::{classification_tool, instruction_for, prompt_fingerprint};

/// Safety gate backed by a forced LLM function call.
///
/// Blank input short-circuits to a safe result without calling the external
/// service. Any transport, parse, or missing-function-call error applies the
/// configured failure policy: fail-open (default) returns the safe default
/// and logs the event; fail-closed surfaces the error.
pub struct LlmGuard {
    client: LlmClient,
    config: GuardConfig,
}

impl LlmGuard {
    /// Create a guard using the given client and configuration.
    pub fn new(client: LlmClient, config: GuardConfig) -> Self {
        let prompt = instruction_for(config.check_type);
        info!(
            check_type = config.check_type.as_str(),
            fail_open = config.fail_open,
            prompt_fingerprint = %prompt_fingerprint(prompt),
            "Guard initialized"
        );

        Self { client, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Apply the configured failure policy for a degraded classification.
    fn degrade(&self, correlation_id: &str, cause: &str) -> Result<GuardResult, CoreError> {
        if self.config.fail_open {
            // Security-relevant decision: the request proceeds unscreened.
            warn!(
                correlation_id = %correlation_id,
                cause = %cause,
                "Guard failed open, returning safe default"
            );
            Ok(GuardResult::safe())
        } else {
            warn!(
                correlation_id = %correlation_id,
                cause = %cause,
                "Guard failed closed"
            );
            Err(CoreError::ProcessingFailed(format!(
                "guard classification failed: {}",
                cause
            )))
        }
    }
}

#[async_trait]
impl SafetyGate for LlmGuard {
    async fn validate(&self, text: &str, correlation_id: &str) -> Result<GuardResult, CoreError> {
        // Blank input carries nothing to screen
        if text.trim().is_empty() {
            return Ok(GuardResult::safe());
        }

        let messages = vec![
            ChatMessage::system(instruction_for(self.config.check_type)),
            ChatMessage::user(text),
        ];
        let request = self
            .client
            .forced_function_request(messages, classification_tool());

        let completion = match self.client.chat_completion(request).await {
            Ok(completion) => completion,
            Err(e) => return self.degrade(correlation_id, &e.to_string()),
        };

        let Some(call) = completion.first_tool_call() else {
            return self.degrade(correlation_id, "no function call in response");
        };

        let result = parse_classification(&call.function.arguments);
        debug!(
            correlation_id = %correlation_id,
            is_safe = result.is_safe,
            risk_score = result.risk_score,
            "Guard classification complete"
        );

        Ok(result)
    }
}

/// Raw classification as the model reports it; every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    is_safe: Option<bool>,
    prompt_injection_detected: Option<bool>,
    malicious_intent_detected: Option<bool>,
    unpermitted_action_detected: Option<bool>,
    risk_score: Option<f64>,
    confidence: Option<f64>,
    reason: Option<String>,
}

/// Parse the function-call arguments into a [`GuardResult`].
///
/// Missing fields default to their safe values; an unparseable payload
/// yields the safe default outright.
fn parse_classification(arguments: &str) -> GuardResult {
    let raw: RawClassification = match serde_json::from_str(extract_json(arguments)) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Unparseable guard classification, using safe default");
            return GuardResult::safe();
        }
    };

    GuardResult {
        is_safe: raw.is_safe.unwrap_or(true),
        prompt_injection: raw.prompt_injection_detected.unwrap_or(false),
        malicious_intent: raw.malicious_intent_detected.unwrap_or(false),
        unpermitted_action: raw.unpermitted_action_detected.unwrap_or(false),
        risk_score: raw.risk_score.unwrap_or(0.0).clamp(0.0, 1.0),
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        reason: raw.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckType;
    use llm_client::LlmConfig;
    use std::time::Duration;

    /// Client pointed at an unroutable endpoint with a short timeout.
    fn offline_guard(config: GuardConfig) -> LlmGuard {
        let client = LlmClient::new(
            LlmConfig::new("test-key", "test-model")
                .with_api_url("http://127.0.0.1:9")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        LlmGuard::new(client, config)
    }

    #[test]
    fn test_parse_full_classification() {
        let result = parse_classification(
            r#"{
                "isSafe": false,
                "promptInjectionDetected": true,
                "maliciousIntentDetected": false,
                "unpermittedActionDetected": false,
                "riskScore": 0.9,
                "confidence": 0.85,
                "reason": "instruction override attempt"
            }"#,
        );

        assert!(!result.is_safe);
        assert!(result.prompt_injection);
        assert!(!result.malicious_intent);
        assert_eq!(result.risk_score, 0.9);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.reason.as_deref(), Some("instruction override attempt"));
    }

    #[test]
    fn test_parse_missing_fields_default_safe() {
        let result = parse_classification(r#"{"riskScore": 0.2}"#);
        assert!(result.is_safe);
        assert!(!result.prompt_injection);
        assert_eq!(result.risk_score, 0.2);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_parse_garbage_defaults_safe() {
        let result = parse_classification("not json at all");
        assert_eq!(result, GuardResult::safe());
    }

    #[test]
    fn test_parse_clamps_scores() {
        let result = parse_classification(r#"{"isSafe": true, "riskScore": 7.5, "confidence": -1}"#);
        assert_eq!(result.risk_score, 1.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_parse_tolerates_wrapped_json() {
        let result =
            parse_classification("```json\n{\"isSafe\": false, \"reason\": \"bad\"}\n```");
        assert!(!result.is_safe);
    }

    #[tokio::test]
    async fn test_blank_input_short_circuits() {
        // Endpoint is unreachable, so a network call would degrade; blank
        // input must return safe without attempting one.
        let guard = offline_guard(GuardConfig::default().with_fail_open(false));
        let result = guard.validate("   ", "corr-1").await.unwrap();
        assert!(result.is_safe);
    }

    #[tokio::test]
    async fn test_transport_error_fails_open() {
        let guard = offline_guard(GuardConfig::default());
        let result = guard.validate("hello", "corr-2").await.unwrap();
        assert!(result.is_safe);
        assert_eq!(result.risk_score, 0.0);
    }

    #[tokio::test]
    async fn test_transport_error_fails_closed_when_configured() {
        let guard = offline_guard(GuardConfig::default().with_fail_open(false));
        let err = guard.validate("hello", "corr-3").await.unwrap_err();
        assert!(matches!(err, CoreError::ProcessingFailed(_)));
    }

    #[test]
    fn test_guard_config_accessor() {
        let guard = offline_guard(GuardConfig::default().with_check_type(CheckType::Condensed));
        assert_eq!(guard.config().check_type, CheckType::Condensed);
    }
}
