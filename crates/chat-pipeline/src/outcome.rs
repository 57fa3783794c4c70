//! Pipeline outcomes and refusal texts.

use support_core::{Language, ResponseTable};

/// Fixed English refusal sentence for unsafe messages.
pub const REFUSAL_EN: &str =
    "I can't help with that request. If you have a question about your accounts or cards, I'm happy to assist.";

/// Fixed Hebrew refusal sentence for unsafe messages.
pub const REFUSAL_HE: &str =
    "אני לא יכול לסייע בבקשה הזו. אם יש לך שאלה על החשבונות או הכרטיסים שלך, אשמח לעזור.";

/// The refusal sentence localized to the customer's language.
pub fn refusal_text(language: Language) -> &'static str {
    match language {
        Language::Hebrew => REFUSAL_HE,
        Language::English => REFUSAL_EN,
    }
}

/// A completed chat answer, already in the customer's language.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Answer text.
    pub answer: String,
    /// Explanation of how the answer was produced.
    pub explanation: String,
    /// Language of the answer.
    pub language: Language,
    /// Correlation id for this request.
    pub correlation_id: String,
    /// Structured tables attached to the answer.
    pub tables: Vec<ResponseTable>,
}

/// The closed set of ways one chat request can end.
///
/// The transport layer translates these into its response shape; the
/// pipeline itself never deals in HTTP statuses.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// The full pipeline ran and produced an answer.
    Answered(ChatReply),
    /// Rejected before anything else: no customer id was supplied.
    RejectedMissingCustomerId,
    /// Rejected before rate limiting or session lookup: blank message text.
    RejectedValidation,
    /// Rejected by the rate limiter, before any session state was touched.
    RejectedRateLimit,
    /// Rejected by the guard; carries the localized refusal answer.
    RejectedUnsafe {
        /// Localized refusal sentence, shaped like a normal reply.
        answer: String,
        /// Language of the refusal.
        language: Language,
        /// Correlation id for this request.
        correlation_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_is_localized() {
        assert_eq!(refusal_text(Language::English), REFUSAL_EN);
        assert_eq!(refusal_text(Language::Hebrew), REFUSAL_HE);
        assert_ne!(REFUSAL_EN, REFUSAL_HE);
    }
}
