use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{FaxCategory, FaxStatus};

/// One ingested document together with its classification and review state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaxRecord {
    pub id: i64,
    pub filename: String,
    pub source_path: String,
    /// SHA-256 of the file content; unique across all records.
    pub content_hash: String,
    pub status: FaxStatus,
    pub ai_category: Option<FaxCategory>,
    pub ai_confidence: Option<f64>,
    pub ai_reason: Option<String>,
    /// Set only once a reviewer approved or overrode the AI decision.
    pub final_category: Option<FaxCategory>,
    pub was_overridden: bool,
    pub override_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub text_length: i64,
    pub summary: Option<String>,
    pub page_count: i64,
    pub is_urgent: bool,
    pub priority_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FaxRecord {
    /// The category the record is filed under: the reviewed one once it
    /// exists, the AI suggestion before that.
    pub fn effective_category(&self) -> Option<FaxCategory> {
        self.final_category.or(self.ai_category)
    }

    /// Copy without the extracted text, for listings.
    pub fn without_text(mut self) -> Self {
        self.raw_text = None;
        self
    }
}

/// Values for a freshly ingested fax.
#[derive(Debug, Clone)]
pub struct NewFax {
    pub filename: String,
    pub source_path: String,
    pub content_hash: String,
    pub status: FaxStatus,
    pub ai_category: FaxCategory,
    pub ai_confidence: f64,
    pub ai_reason: String,
    pub raw_text: String,
    pub summary: Option<String>,
    pub page_count: i64,
    pub is_urgent: bool,
    pub priority_score: i64,
    pub received_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

/// A captured correction: what the AI said versus what a human confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub fax_id: i64,
    pub ai_category: FaxCategory,
    pub correct_category: FaxCategory,
    pub feedback_text: Option<String>,
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub fax_id: i64,
    pub ai_category: FaxCategory,
    pub correct_category: FaxCategory,
    pub feedback_text: Option<String>,
    pub submitted_by: Option<String>,
}
