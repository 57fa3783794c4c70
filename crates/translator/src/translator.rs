//! The translation adapter implementation.

use serde_json::Value;
use tracing::{debug, warn};

use llm_client::{extract_json, ChatMessage, LlmClient};
use support_core::{async_trait, CoreError, Language, TranslationResult, Translator};

use crate::prompts::{INBOUND_SYSTEM_PROMPT, OUTBOUND_SYSTEM_PROMPT};

/// Confidence when the provider judged the text already English.
const ALREADY_ENGLISH_CONFIDENCE: f64 = 0.95;

/// Confidence for a translation the provider actually produced.
const TRANSLATED_CONFIDENCE: f64 = 0.9;

/// LLM-backed translation adapter for both directions.
pub struct LlmTranslator {
    client: LlmClient,
}

impl LlmTranslator {
    /// Create a translator using the given client.
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// A degraded inbound result carrying the original text.
    fn stub_inbound(text: &str, source: Language, error: String) -> TranslationResult {
        TranslationResult {
            original_text: text.to_string(),
            translated_text: text.to_string(),
            source_language: source,
            target_language: Language::English,
            confidence: 0.0,
            success: false,
            error: Some(error),
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate_inbound(
        &self,
        text: &str,
        source: Language,
        correlation_id: &str,
    ) -> Result<TranslationResult, CoreError> {
        if text.trim().is_empty() {
            return Ok(TranslationResult::unchanged(text, source, 0.0));
        }

        let messages = vec![
            ChatMessage::system(INBOUND_SYSTEM_PROMPT),
            ChatMessage::user(text),
        ];
        let request = self.client.request(messages);

        let completion = match self.client.chat_completion(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Inbound translation degraded to original text"
                );
                return Ok(Self::stub_inbound(text, source, e.to_string()));
            }
        };

        let translated = completion.first_content().unwrap_or_default().trim();

        // An empty reply (or a literal empty-quote pair) means the provider
        // judged the text already English.
        if translated.is_empty() || translated == "\"\"" || translated == "''" {
            debug!(correlation_id = %correlation_id, "No translation needed");
            return Ok(TranslationResult {
                original_text: text.to_string(),
                translated_text: text.to_string(),
                source_language: source,
                target_language: Language::English,
                confidence: ALREADY_ENGLISH_CONFIDENCE,
                success: true,
                error: None,
            });
        }

        debug!(
            correlation_id = %correlation_id,
            source = %source,
            chars = translated.len(),
            "Inbound translation complete"
        );

        Ok(TranslationResult {
            original_text: text.to_string(),
            translated_text: translated.to_string(),
            source_language: source,
            target_language: Language::English,
            confidence: TRANSLATED_CONFIDENCE,
            success: true,
            error: None,
        })
    }

    async fn translate_json(
        &self,
        json: Value,
        target: Language,
        correlation_id: &str,
    ) -> Result<Value, CoreError> {
        // Nothing to do when the response is already in the target language
        if target.is_english() {
            return Ok(json);
        }

        let Some(input_object) = json.as_object() else {
            warn!(correlation_id = %correlation_id, "Outbound translation input is not an object");
            return Ok(json);
        };

        let payload = match serde_json::to_string(&json) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(correlation_id = %correlation_id, error = %e, "Unserializable outbound payload");
                return Ok(json);
            }
        };

        let system = format!(
            "{}\n\nTarget language: {}.",
            OUTBOUND_SYSTEM_PROMPT,
            target.code()
        );
        let request = self
            .client
            .request(vec![ChatMessage::system(system), ChatMessage::user(payload)]);

        let completion = match self.client.chat_completion(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Outbound translation degraded to untranslated response"
                );
                return Ok(json);
            }
        };

        let content = completion.first_content().unwrap_or_default();
        let translated: Value = match serde_json::from_str(extract_json(content)) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Unparseable outbound translation, keeping untranslated response"
                );
                return Ok(json);
            }
        };

        // The key set must survive translation; a reshaped object is worse
        // than an untranslated one.
        match translated.as_object() {
            Some(object) if same_key_set(input_object, object) => {
                debug!(correlation_id = %correlation_id, target = %target, "Outbound translation complete");
                Ok(translated)
            }
            _ => {
                warn!(
                    correlation_id = %correlation_id,
                    "Outbound translation changed the object shape, keeping untranslated response"
                );
                Ok(json)
            }
        }
    }
}

/// Whether two objects carry exactly the same top-level keys.
fn same_key_set(
    a: &serde_json::Map<String, Value>,
    b: &serde_json::Map<String, Value>,
) -> bool {
    a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
}
