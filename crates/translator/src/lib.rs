//! Bidirectional translation between the customer language and English.
//!
//! Two asymmetric directions:
//!
//! - Inbound (source -> English) works on plain text. An empty reply, or the
//!   literal `""` / `''`, means the provider judged the text already English;
//!   the original is kept with high confidence.
//! - Outbound (English -> source) works on a render-ready JSON object and
//!   must translate values only, preserving every key.
//!
//! Both directions degrade instead of failing: a translation outage lowers
//! quality, never availability.

mod prompts;
mod translator;

pub use prompts::{INBOUND_SYSTEM_PROMPT, OUTBOUND_SYSTEM_PROMPT};
pub use translator::LlmTranslator;
