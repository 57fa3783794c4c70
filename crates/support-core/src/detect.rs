//! Character-based Hebrew/English language detection.
//!
//! This is a heuristic, not a general language classifier: a message is
//! Hebrew if it contains any character from the Hebrew Unicode block
//! (U+0590-U+05FF), English otherwise.

use crate::language::Language;

/// Result of one language detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguageDetectionResult {
    /// Detected language.
    pub language: Language,
    /// Confidence in [0, 1]. Blank input yields 0.0 (undetected).
    pub confidence: f64,
}

/// Detect the language of a message.
///
/// Confidence is the share of letters belonging to the detected script
/// (Hebrew-block letters for Hebrew, ASCII letters for English), with 0.5
/// returned when the text contains no letters at all. Blank input returns
/// English with confidence 0.0 so callers treat it as "undetected" rather
/// than a real signal.
pub fn detect_language(text: &str) -> LanguageDetectionResult {
    if text.trim().is_empty() {
        return LanguageDetectionResult {
            language: Language::English,
            confidence: 0.0,
        };
    }

    let mut letters = 0usize;
    let mut hebrew = 0usize;
    let mut ascii = 0usize;

    for ch in text.chars() {
        if is_hebrew_letter(ch) {
            letters += 1;
            hebrew += 1;
        } else if ch.is_alphabetic() {
            letters += 1;
            if ch.is_ascii_alphabetic() {
                ascii += 1;
            }
        }
    }

    let (language, matching) = if hebrew > 0 {
        (Language::Hebrew, hebrew)
    } else {
        (Language::English, ascii)
    };

    let confidence = if letters == 0 {
        0.5
    } else {
        (matching as f64 / letters as f64).min(1.0)
    };

    LanguageDetectionResult {
        language,
        confidence,
    }
}

/// Whether a character falls in the Hebrew Unicode block (U+0590-U+05FF).
fn is_hebrew_letter(ch: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&ch)
}
