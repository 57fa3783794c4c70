//! Per-request context.

use std::time::SystemTime;

use uuid::Uuid;

/// Ephemeral context for one inbound chat request.
///
/// Constructed at pipeline entry and discarded once the response is
/// produced; never stored. The customer id comes from a trusted header,
/// never from message content.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Trusted customer identifier.
    pub customer_id: String,
    /// Correlation id generated per request, used for tracing only.
    pub correlation_id: String,
    /// Session this request resolved to (set once the session is fetched).
    pub session_id: Option<String>,
    /// Original message text as received.
    pub message_text: String,
    /// English text after inbound translation, when one was performed.
    pub translated_text: Option<String>,
    /// When the request was received.
    pub received_at: SystemTime,
}

impl RequestContext {
    /// Create a context for a new inbound request with a fresh correlation id.
    pub fn new(customer_id: impl Into<String>, message_text: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            correlation_id: Uuid::new_v4().to_string(),
            session_id: None,
            message_text: message_text.into(),
            translated_text: None,
            received_at: SystemTime::now(),
        }
    }

    /// The text the reasoning component should see: the translated text if
    /// inbound translation ran, otherwise the original message.
    pub fn normalized_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.message_text)
    }
}
