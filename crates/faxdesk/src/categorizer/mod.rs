//! Categorization engine and summarizer.
//!
//! Both run over extracted document text and call the configured
//! [`TextGenerator`]. Neither ever fails: generation errors are logged and
//! treated as an empty response.

pub mod cascade;
pub mod prompt;

use std::sync::Arc;

use serde::Serialize;

use crate::fax::FaxCategory;
use crate::generation::TextGenerator;

/// Texts with fewer trimmed characters than this are not sent out.
pub const MIN_TEXT_CHARS: usize = 50;
pub const CATEGORIZE_MAX_TOKENS: u32 = 200;
pub const SUMMARY_MAX_TOKENS: u32 = 200;

pub const INSUFFICIENT_TEXT_CONFIDENCE: f64 = 0.3;
pub const INSUFFICIENT_TEXT_REASON: &str = "insufficient text";
pub const INSUFFICIENT_TEXT_SUMMARY: &str = "Insufficient text to summarize.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorization {
    pub category: FaxCategory,
    pub confidence: f64,
    pub reason: String,
}

pub struct Categorizer {
    generator: Arc<dyn TextGenerator>,
}

impl Categorizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn categorize(&self, text: &str) -> Categorization {
        if is_insufficient(text) {
            log::debug!("Text too short to categorize ({} chars)", text.trim().len());
            return Categorization {
                category: FaxCategory::Unknown,
                confidence: INSUFFICIENT_TEXT_CONFIDENCE,
                reason: INSUFFICIENT_TEXT_REASON.to_string(),
            };
        }

        let prompt = prompt::categorize_prompt(text);
        let raw = match self.generator.generate(&prompt, CATEGORIZE_MAX_TOKENS) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Categorization generation failed: {}", e);
                String::new()
            }
        };

        let result = cascade::parse_response(raw.trim());
        log::debug!(
            "Categorized as {} (confidence {:.2})",
            result.category,
            result.confidence
        );
        result
    }

    /// Returns `None` when generation fails or yields nothing.
    pub fn summarize(&self, text: &str) -> Option<String> {
        if is_insufficient(text) {
            return Some(INSUFFICIENT_TEXT_SUMMARY.to_string());
        }

        match self
            .generator
            .generate(&prompt::summary_prompt(text), SUMMARY_MAX_TOKENS)
        {
            Ok(summary) => {
                let summary = summary.trim();
                (!summary.is_empty()).then(|| summary.to_string())
            }
            Err(e) => {
                log::warn!("Summary generation failed: {}", e);
                None
            }
        }
    }
}

fn is_insufficient(text: &str) -> bool {
    text.trim().chars().count() < MIN_TEXT_CHARS
}
