//! Extraction of JSON objects from model output.
//!
//! Models asked for "JSON only" still wrap the object in markdown fences or
//! append stray text and braces; these helpers recover the object.

/// Extract a JSON object from a response that may contain markdown or other text.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Bare object
    if trimmed.starts_with('{') {
        return extract_balanced_json(trimmed);
    }

    // ```json fence
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            let extracted = trimmed[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    // Generic fence, possibly with a language tag on the first line
    if let Some(start) = trimmed.find("```") {
        let after_backticks = &trimmed[start + 3..];
        let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(end) = after_backticks[json_start..].find("```") {
            let extracted = after_backticks[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    // Object buried in surrounding prose
    if let Some(start) = trimmed.find('{') {
        return extract_balanced_json(&trimmed[start..]);
    }

    trimmed
}

/// Extract a balanced JSON object from a string that starts with '{'.
///
/// Handles trailing characters the model sometimes appends, e.g.
/// `{"a": 1}}}` -> `{"a": 1}`.
fn extract_balanced_json(s: &str) -> &str {
    if !s.starts_with('{') {
        return s;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    // Top-level object closed here; drop anything after it
                    return &s[..=i];
                }
            }
            _ => {}
        }
    }

    // Never balanced; hand back the input for the caller's parser to reject
    s
}
