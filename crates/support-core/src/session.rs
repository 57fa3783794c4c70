//! Per-customer conversational session state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// Maximum number of conversation summaries retained per session.
///
/// Oldest entries are evicted first to bound prompt/context size.
pub const MAX_CONVERSATION_SUMMARIES: usize = 10;

/// The intent the reasoning component last resolved for this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIntent {
    /// Business domain (e.g. "accounts", "cards").
    pub domain: String,
    /// Metric or question kind within the domain (e.g. "balance").
    pub metric: String,
    /// Free-form parameters attached to the intent.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// An absolute time range resolved from the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
}

/// Entities the customer selected in earlier turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedEntities {
    /// Masked account references (e.g. "****1234").
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Masked card references.
    #[serde(default)]
    pub cards: Vec<String>,
    /// Other entity kinds, keyed by name.
    #[serde(default)]
    pub named: HashMap<String, Vec<String>>,
}

/// A pending clarification the system asked the customer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationState {
    /// The question text shown to the customer.
    pub question: String,
    /// What shape of answer is expected (e.g. "date-range", "account-choice").
    pub expected_answer: String,
    /// What the clarification is about (intent field, entity, etc.).
    pub subject: String,
    /// When the question was asked.
    pub asked_at: Instant,
}

/// Per-session answer defaults, each independently overridable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    /// Preferred transaction status filter (e.g. "completed").
    pub transaction_status: Option<String>,
    /// Preferred display currency.
    pub currency: Option<String>,
    /// Paging cursor policy for list answers.
    pub paging_policy: Option<String>,
    /// Page size for list answers.
    pub page_size: Option<u32>,
}

/// A compact record of one prior Q&A turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// The customer's message for that turn.
    pub user_message: String,
    /// A compact textual summary of the response.
    pub response_summary: String,
}

/// Long-lived conversational state for one customer.
///
/// A customer has at most one active session. The session is created on the
/// first message, mutated by the pipeline after each stage that derives new
/// state, and destroyed by explicit logout or the idle-expiry sweep.
#[derive(Debug, Clone)]
pub struct ChatSessionContext {
    /// Stable session identifier, assigned at creation.
    pub session_id: String,
    /// Owning customer. Immutable after creation.
    pub customer_id: String,
    /// Detected language, once established.
    pub language: Option<Language>,
    /// Confidence of the detection that established the language.
    pub language_confidence: Option<f64>,
    /// Customer timezone, when known.
    pub timezone: Option<String>,
    /// Last resolved intent.
    pub last_intent: Option<ResolvedIntent>,
    /// Last resolved absolute time range.
    pub last_time_range: Option<TimeRange>,
    /// Entities selected in earlier turns.
    pub selected_entities: SelectedEntities,
    /// Pending clarification, if the system is awaiting a follow-up answer.
    pub clarification: Option<ClarificationState>,
    /// Per-session answer defaults.
    pub defaults: SessionDefaults,
    /// Bounded list of prior-turn summaries, oldest first.
    pub summaries: Vec<ConversationSummary>,
    /// When the session was created.
    pub created_at: Instant,
    /// Last access time. Monotonically non-decreasing; updated on every access.
    pub last_accessed_at: Instant,
}

impl ChatSessionContext {
    /// Create a fresh session for a customer.
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self::new_at(customer_id, Instant::now())
    }

    /// Create a fresh session with an explicit creation time.
    pub fn new_at(customer_id: impl Into<String>, now: Instant) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            language: None,
            language_confidence: None,
            timezone: None,
            last_intent: None,
            last_time_range: None,
            selected_entities: SelectedEntities::default(),
            clarification: None,
            defaults: SessionDefaults::default(),
            summaries: Vec::new(),
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Mark the session as accessed now.
    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    /// Mark the session as accessed at `now`, never moving the clock backwards.
    pub fn touch_at(&mut self, now: Instant) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
    }

    /// Whether the session has been idle longer than `idle_timeout` at `now`.
    pub fn is_expired_at(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_accessed_at) > idle_timeout
    }

    /// Establish the session language from a detection.
    ///
    /// Once established the language is not overwritten; use
    /// [`redetect_language`](Self::redetect_language) for an explicit
    /// re-detection decision.
    pub fn establish_language(&mut self, language: Language, confidence: f64) {
        if self.language.is_none() {
            self.language = Some(language);
            self.language_confidence = Some(confidence);
        }
    }

    /// Explicitly overwrite the established language.
    pub fn redetect_language(&mut self, language: Language, confidence: f64) {
        self.language = Some(language);
        self.language_confidence = Some(confidence);
    }

    /// The active language for this session, defaulting to English until
    /// detection has run.
    pub fn active_language(&self) -> Language {
        self.language.unwrap_or(Language::English)
    }

    /// Append a turn summary, evicting the oldest beyond the retention bound.
    pub fn push_summary(&mut self, user_message: impl Into<String>, response_summary: impl Into<String>) {
        self.summaries.push(ConversationSummary {
            user_message: user_message.into(),
            response_summary: response_summary.into(),
        });
        if self.summaries.len() > MAX_CONVERSATION_SUMMARIES {
            let excess = self.summaries.len() - MAX_CONVERSATION_SUMMARIES;
            self.summaries.drain(0..excess);
        }
    }
}
