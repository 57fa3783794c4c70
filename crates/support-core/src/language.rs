//! Language codes handled by the pipeline.

use serde::{Deserialize, Serialize};

/// The two languages the pipeline distinguishes.
///
/// English is the internal processing language; Hebrew messages are
/// translated in and out around the reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (`en`), the internal processing language.
    #[serde(rename = "en")]
    English,
    /// Hebrew (`he`).
    #[serde(rename = "he")]
    Hebrew,
}

impl Language {
    /// The ISO 639-1 code for this language.
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hebrew => "he",
        }
    }

    /// Whether this is the internal processing language.
    pub fn is_english(&self) -> bool {
        matches!(self, Self::English)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
