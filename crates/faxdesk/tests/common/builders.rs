//! Fixture texts and request builders.

#![allow(dead_code)]

use faxdesk::{FaxCategory, ReviewAction, ReviewRequest};

/// Long enough to pass the minimum text check, no urgency keywords.
pub const INVOICE_TEXT: &str = "Invoice #4411 from Northside Imaging for services rendered \
                                on 12 March, payable within 30 days.";

pub const URGENT_TEXT: &str = "URGENT: patient requires callback regarding abnormal potassium \
                               level, please contact the ordering physician today.";

pub const SHORT_TEXT: &str = "blank page";

/// Builder for `ReviewRequest`.
pub struct ReviewRequestBuilder {
    request: ReviewRequest,
}

impl ReviewRequestBuilder {
    pub fn approve() -> Self {
        Self {
            request: ReviewRequest::approve(None),
        }
    }

    pub fn override_action() -> Self {
        Self {
            request: ReviewRequest {
                action: ReviewAction::Override,
                category: None,
                reason: None,
                reviewer: None,
            },
        }
    }

    pub fn category(mut self, category: FaxCategory) -> Self {
        self.request.category = Some(category);
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.request.reason = Some(reason.to_string());
        self
    }

    pub fn reviewer(mut self, reviewer: &str) -> Self {
        self.request.reviewer = Some(reviewer.to_string());
        self
    }

    pub fn build(self) -> ReviewRequest {
        self.request
    }
}

/// Distinct fixture text per index, so content hashes differ.
pub fn invoice_text(n: usize) -> String {
    format!("{} Reference {}.", INVOICE_TEXT, n)
}
