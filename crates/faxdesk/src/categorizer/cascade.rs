//! Parsing cascade for categorization responses.
//!
//! Each stage is an independent attempt over the raw response text; the
//! first stage returning `Some` wins and [`default_stage`] ends the chain.

use serde::Deserialize;

use super::Categorization;
use crate::fax::FaxCategory;

pub const KEYWORD_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_REASON: &str = "unable to determine category";

/// A parsing attempt over the raw response.
pub type Stage = fn(&str) -> Option<Categorization>;

/// Stages in the order they are tried.
pub const STAGES: &[Stage] = &[json_stage, keyword_stage];

/// Runs every stage in order and falls back to [`default_stage`].
pub fn parse_response(raw: &str) -> Categorization {
    STAGES
        .iter()
        .find_map(|stage| stage(raw))
        .unwrap_or_else(default_stage)
}

#[derive(Deserialize)]
struct RawCategorization {
    #[serde(default)]
    category: Option<serde_json::Value>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default)]
    reason: Option<serde_json::Value>,
}

/// Stage a: the first balanced-brace JSON object with a known category.
pub fn json_stage(raw: &str) -> Option<Categorization> {
    let json = extract_json(raw)?;
    let parsed: RawCategorization = serde_json::from_str(json).ok()?;

    let category = parsed
        .category
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(FaxCategory::parse_loose)?;

    let confidence = parsed
        .confidence
        .as_ref()
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let reason = parsed
        .reason
        .as_ref()
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REASON)
        .to_string();

    Some(Categorization {
        category,
        confidence,
        reason,
    })
}

/// Stage b: the first category, in enumeration order, named anywhere in
/// the response. Both `lab_results` and `lab results` match.
pub fn keyword_stage(raw: &str) -> Option<Categorization> {
    let lower = raw.to_lowercase();
    let category = FaxCategory::ALL.iter().copied().find(|c| {
        let name = c.as_str();
        lower.contains(name) || lower.contains(&name.replace('_', " "))
    })?;

    Some(Categorization {
        category,
        confidence: KEYWORD_CONFIDENCE,
        reason: raw.trim().to_string(),
    })
}

/// Stage c: nothing usable in the response.
pub fn default_stage() -> Categorization {
    Categorization {
        category: FaxCategory::Unknown,
        confidence: DEFAULT_CONFIDENCE,
        reason: DEFAULT_REASON.to_string(),
    }
}

/// Returns the first balanced `{...}` substring, honoring braces inside
/// JSON strings and escape sequences. A `{` that never closes is skipped and
/// the scan resumes at the next one. `None` when no object closes.
pub fn extract_json(response: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(offset) = response[from..].find('{') {
        let start = from + offset;
        if let Some(len) = balanced_len(&response[start..]) {
            return Some(&response[start..start + len]);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the object opening at the start of `text`, if it closes.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
