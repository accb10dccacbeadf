//! Urgency scoring over extracted text and the chosen category.

use serde::Serialize;

use crate::fax::FaxCategory;

/// Words that mark a document as urgent wherever they appear.
pub const URGENT_KEYWORDS: [&str; 9] = [
    "urgent",
    "asap",
    "immediately",
    "emergency",
    "stat",
    "critical",
    "time-sensitive",
    "rush",
    "priority",
];

pub const MAX_PRIORITY: i64 = 100;

const URGENT_CATEGORY_PRIORITY: i64 = 50;
const KEYWORD_PRIORITY: i64 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Urgency {
    pub is_urgent: bool,
    pub priority: i64,
}

/// Scores `text` filed under `category`.
///
/// Keyword matching is a plain substring search on the lowercased text, so
/// "status" also matches "stat".
pub fn score(text: &str, category: FaxCategory) -> Urgency {
    let mut is_urgent = false;
    let mut priority = 0;

    if category == FaxCategory::Urgent {
        is_urgent = true;
        priority = URGENT_CATEGORY_PRIORITY;
    }

    let lower = text.to_lowercase();
    if URGENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        is_urgent = true;
        priority = priority.max(KEYWORD_PRIORITY);
    }

    if let Some(floor) = category_floor(category) {
        priority = priority.max(floor);
    }

    Urgency {
        is_urgent,
        priority: priority.clamp(0, MAX_PRIORITY),
    }
}

fn category_floor(category: FaxCategory) -> Option<i64> {
    match category {
        FaxCategory::Prescriptions => Some(60),
        FaxCategory::Referrals => Some(55),
        FaxCategory::LabResults => Some(50),
        _ => None,
    }
}
