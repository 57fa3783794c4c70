//! Translation contract and result type.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::language::Language;

/// Output of one inbound translation call. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// The text as received.
    pub original_text: String,
    /// The translated text (equal to the original when none was needed).
    pub translated_text: String,
    /// Source language code.
    pub source_language: Language,
    /// Target language code.
    pub target_language: Language,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Whether the provider call succeeded.
    pub success: bool,
    /// Error detail when the call degraded.
    pub error: Option<String>,
}

impl TranslationResult {
    /// A pass-through result for text that needed no translation.
    pub fn unchanged(text: impl Into<String>, language: Language, confidence: f64) -> Self {
        let text = text.into();
        Self {
            original_text: text.clone(),
            translated_text: text,
            source_language: language,
            target_language: language,
            confidence,
            success: true,
            error: None,
        }
    }
}

/// Bidirectional translation between the customer language and English.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a customer message into English.
    ///
    /// Must degrade (returning the original text with `success = false`)
    /// rather than fail the request on transport or parse errors.
    async fn translate_inbound(
        &self,
        text: &str,
        source: Language,
        correlation_id: &str,
    ) -> Result<TranslationResult, CoreError>;

    /// Translate the values of a render-ready JSON response into `target`,
    /// preserving every key and all embedded numbers, dates, and currency.
    ///
    /// On any failure the input is returned unchanged.
    async fn translate_json(
        &self,
        json: Value,
        target: Language,
        correlation_id: &str,
    ) -> Result<Value, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_result() {
        let result = TranslationResult::unchanged("hello", Language::English, 0.95);
        assert_eq!(result.original_text, "hello");
        assert_eq!(result.translated_text, "hello");
        assert!(result.success);
        assert_eq!(result.confidence, 0.95);
    }
}
