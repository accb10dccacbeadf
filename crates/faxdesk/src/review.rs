//! Review workflow over stored faxes.
//!
//! ```text
//! pending ─┐
//!          ├─ approve ──▶ approved ─┐
//! categorized ─ override ─▶ overridden ─┼─ mark_processed ─▶ processed
//! ```
//!
//! Approve and override may be repeated (last write wins). `processed` is
//! terminal for both; `mark_processed` and `delete` work from any state.

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{fax_repo, feedback_repo, Database, FaxFilter};
use crate::error::ReviewError;
use crate::fax::{FaxCategory, FaxRecord, FaxStatus, FeedbackRecord, NewFeedback};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Override,
}

impl FromStr for ReviewAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "override" => Ok(Self::Override),
            other => Err(format!("unknown review action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,
    #[serde(default)]
    pub category: Option<FaxCategory>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
}

impl ReviewRequest {
    pub fn approve(reviewer: Option<String>) -> Self {
        Self {
            action: ReviewAction::Approve,
            category: None,
            reason: None,
            reviewer,
        }
    }

    pub fn override_to(
        category: FaxCategory,
        reason: Option<String>,
        reviewer: Option<String>,
    ) -> Self {
        Self {
            action: ReviewAction::Override,
            category: Some(category),
            reason,
            reviewer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub id: i64,
    pub status: FaxStatus,
    pub final_category: Option<FaxCategory>,
    pub was_overridden: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub processed: usize,
    pub failed: usize,
    pub message: String,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct FaxPage {
    pub items: Vec<FaxRecord>,
    pub total: u64,
}

#[derive(Clone)]
pub struct ReviewWorkflow {
    db: Database,
}

impl ReviewWorkflow {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Full record including extracted text.
    pub fn get(&self, id: i64) -> Result<FaxRecord, ReviewError> {
        fax_repo::find_by_id(&self.db, id)?.ok_or(ReviewError::NotFound(id))
    }

    /// Filtered listing without extracted text.
    pub fn list(&self, filter: &FaxFilter) -> Result<FaxPage, ReviewError> {
        let (items, total) = fax_repo::query(&self.db, filter)?;
        Ok(FaxPage {
            items: items.into_iter().map(FaxRecord::without_text).collect(),
            total,
        })
    }

    /// Faxes waiting for review, most urgent first.
    pub fn queue(&self, limit: Option<u64>, offset: Option<u64>) -> Result<FaxPage, ReviewError> {
        self.list(&FaxFilter {
            status: Some(FaxStatus::Categorized),
            limit,
            offset,
            ..Default::default()
        })
    }

    pub fn feedback_for(&self, id: i64) -> Result<Vec<FeedbackRecord>, ReviewError> {
        Ok(feedback_repo::list_for_fax(&self.db, id)?)
    }

    pub fn review(&self, id: i64, request: &ReviewRequest) -> Result<ReviewOutcome, ReviewError> {
        match request.action {
            ReviewAction::Approve => self.approve(id, request.reviewer.as_deref()),
            ReviewAction::Override => self.override_category(
                id,
                request.category,
                request.reason.as_deref(),
                request.reviewer.as_deref(),
            ),
        }
    }

    /// Accepts the AI category as final.
    pub fn approve(&self, id: i64, reviewer: Option<&str>) -> Result<ReviewOutcome, ReviewError> {
        let record = self.db.with_tx(|tx| -> Result<FaxRecord, ReviewError> {
            let fax = fax_repo::find_in(tx, id)?.ok_or(ReviewError::NotFound(id))?;
            ensure_reviewable(&fax)?;
            fax_repo::mark_approved(tx, id, reviewer, &Utc::now())?;
            fax_repo::find_in(tx, id)?.ok_or(ReviewError::NotFound(id))
        })?;

        log::info!("Fax {} approved as {:?}", id, record.final_category);
        Ok(outcome(record, "AI categorization approved.".to_string()))
    }

    /// Replaces the AI category and records one feedback entry.
    pub fn override_category(
        &self,
        id: i64,
        category: Option<FaxCategory>,
        reason: Option<&str>,
        reviewer: Option<&str>,
    ) -> Result<ReviewOutcome, ReviewError> {
        let category = category.ok_or_else(|| {
            ReviewError::Validation("Category is required for override action".to_string())
        })?;

        let record = self.db.with_tx(|tx| -> Result<FaxRecord, ReviewError> {
            let fax = fax_repo::find_in(tx, id)?.ok_or(ReviewError::NotFound(id))?;
            ensure_reviewable(&fax)?;

            feedback_repo::insert_in(
                tx,
                &NewFeedback {
                    fax_id: id,
                    ai_category: fax.ai_category.unwrap_or(FaxCategory::Unknown),
                    correct_category: category,
                    feedback_text: reason.map(str::to_string),
                    submitted_by: reviewer.map(str::to_string),
                },
            )?;
            fax_repo::mark_overridden(tx, id, category, reason, reviewer, &Utc::now())?;
            fax_repo::find_in(tx, id)?.ok_or(ReviewError::NotFound(id))
        })?;

        log::info!("Fax {} overridden to {}", id, category);
        Ok(outcome(
            record,
            format!("Category overridden to {}.", category),
        ))
    }

    /// Applies `request` to every id independently. Failures are counted,
    /// never raised.
    pub fn batch_review(&self, ids: &[i64], request: &ReviewRequest) -> BatchOutcome {
        let mut processed = 0;
        let mut failed = 0;

        for &id in ids {
            match self.review(id, request) {
                Ok(_) => processed += 1,
                Err(e) => {
                    log::warn!("Batch review of fax {} failed: {}", id, e);
                    failed += 1;
                }
            }
        }

        BatchOutcome {
            processed,
            failed,
            message: format!("Processed {} faxes, {} failed.", processed, failed),
        }
    }

    pub fn batch_approve(&self, ids: &[i64], reviewer: Option<String>) -> BatchOutcome {
        self.batch_review(ids, &ReviewRequest::approve(reviewer))
    }

    /// Files a fax without formal review. Allowed from any state.
    pub fn mark_processed(&self, id: i64) -> Result<(), ReviewError> {
        match fax_repo::update_status(&self.db, id, FaxStatus::Processed, &Utc::now())? {
            0 => Err(ReviewError::NotFound(id)),
            _ => {
                log::info!("Fax {} marked processed", id);
                Ok(())
            }
        }
    }

    /// Removes a fax and its feedback.
    pub fn delete(&self, id: i64) -> Result<(), ReviewError> {
        if fax_repo::delete(&self.db, id)? {
            log::info!("Fax {} deleted", id);
            Ok(())
        } else {
            Err(ReviewError::NotFound(id))
        }
    }

    /// Records a correction without changing the fax itself.
    pub fn submit_feedback(
        &self,
        fax_id: i64,
        correct_category: FaxCategory,
        feedback_text: Option<String>,
        submitted_by: Option<String>,
    ) -> Result<FeedbackRecord, ReviewError> {
        let fax = self.get(fax_id)?;
        let feedback_id = feedback_repo::insert(
            &self.db,
            &NewFeedback {
                fax_id,
                ai_category: fax.ai_category.unwrap_or(FaxCategory::Unknown),
                correct_category,
                feedback_text,
                submitted_by,
            },
        )?;

        feedback_repo::list_for_fax(&self.db, fax_id)?
            .into_iter()
            .find(|f| f.id == feedback_id)
            .ok_or(ReviewError::NotFound(fax_id))
    }
}

fn ensure_reviewable(fax: &FaxRecord) -> Result<(), ReviewError> {
    if fax.status.is_terminal() {
        return Err(ReviewError::Validation(format!(
            "Fax {} is already {}",
            fax.id, fax.status
        )));
    }
    Ok(())
}

fn outcome(record: FaxRecord, message: String) -> ReviewOutcome {
    ReviewOutcome {
        id: record.id,
        status: record.status,
        final_category: record.final_category,
        was_overridden: record.was_overridden,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fax_repo::tests::sample_fax;

    fn setup() -> (ReviewWorkflow, Database) {
        let db = Database::open_in_memory().unwrap();
        (ReviewWorkflow::new(db.clone()), db)
    }

    fn add(db: &Database, hash: &str) -> i64 {
        fax_repo::insert(db, &sample_fax(hash)).unwrap().id
    }

    #[test]
    fn test_approve_sets_final_category() {
        let (review, db) = setup();
        let id = add(&db, "a");

        let out = review.approve(id, Some("alice")).unwrap();
        assert_eq!(out.status, FaxStatus::Approved);
        assert_eq!(out.final_category, Some(FaxCategory::Billing));
        assert!(!out.was_overridden);

        let again = review.approve(id, Some("alice")).unwrap();
        assert_eq!(again.status, FaxStatus::Approved);
    }

    #[test]
    fn test_override_requires_category() {
        let (review, db) = setup();
        let id = add(&db, "a");

        let err = review.override_category(id, None, None, None).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert_eq!(feedback_repo::count(&db, None).unwrap(), 0);
    }

    #[test]
    fn test_override_records_one_feedback() {
        let (review, db) = setup();
        let id = add(&db, "a");

        let out = review
            .override_category(
                id,
                Some(FaxCategory::Insurance),
                Some("EOB form"),
                Some("bob"),
            )
            .unwrap();
        assert_eq!(out.status, FaxStatus::Overridden);
        assert_eq!(out.final_category, Some(FaxCategory::Insurance));
        assert!(out.was_overridden);

        let feedback = review.feedback_for(id).unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].ai_category, FaxCategory::Billing);
        assert_eq!(feedback[0].correct_category, FaxCategory::Insurance);

        let stored = review.get(id).unwrap();
        assert_eq!(stored.override_reason.as_deref(), Some("EOB form"));
    }

    #[test]
    fn test_not_found_is_distinct_from_validation() {
        let (review, _db) = setup();
        assert!(matches!(review.approve(99, None), Err(ReviewError::NotFound(99))));
        assert!(matches!(
            review.override_category(99, Some(FaxCategory::Billing), None, None),
            Err(ReviewError::NotFound(99))
        ));
        assert!(matches!(review.mark_processed(99), Err(ReviewError::NotFound(99))));
        assert!(matches!(review.delete(99), Err(ReviewError::NotFound(99))));
    }

    #[test]
    fn test_processed_is_terminal_for_review() {
        let (review, db) = setup();
        let id = add(&db, "a");
        review.mark_processed(id).unwrap();

        assert!(matches!(review.approve(id, None), Err(ReviewError::Validation(_))));
        assert_eq!(review.get(id).unwrap().status, FaxStatus::Processed);
        review.mark_processed(id).unwrap();
    }

    #[test]
    fn test_batch_isolates_failures() {
        let (review, db) = setup();
        let ids = vec![add(&db, "a"), 4242, add(&db, "b"), add(&db, "c")];

        let out = review.batch_approve(&ids, Some("carol".into()));
        assert_eq!(out.processed, 3);
        assert_eq!(out.failed, 1);
        assert_eq!(out.message, "Processed 3 faxes, 1 failed.");
    }

    #[test]
    fn test_batch_override_without_category_fails_every_id() {
        let (review, db) = setup();
        let ids = vec![add(&db, "a"), add(&db, "b")];
        let request = ReviewRequest {
            action: ReviewAction::Override,
            category: None,
            reason: None,
            reviewer: None,
        };

        let out = review.batch_review(&ids, &request);
        assert_eq!((out.processed, out.failed), (0, 2));
    }

    #[test]
    fn test_delete_removes_feedback() {
        let (review, db) = setup();
        let id = add(&db, "a");
        review
            .override_category(id, Some(FaxCategory::Referrals), None, None)
            .unwrap();

        review.delete(id).unwrap();
        assert_eq!(feedback_repo::count(&db, None).unwrap(), 0);
        assert!(matches!(review.get(id), Err(ReviewError::NotFound(_))));
    }

    #[test]
    fn test_submit_feedback_keeps_fax_unchanged() {
        let (review, db) = setup();
        let id = add(&db, "a");

        let fb = review
            .submit_feedback(id, FaxCategory::Administrative, Some("memo".into()), None)
            .unwrap();
        assert_eq!(fb.fax_id, id);
        assert_eq!(fb.ai_category, FaxCategory::Billing);
        assert_eq!(review.get(id).unwrap().status, FaxStatus::Categorized);

        assert!(matches!(
            review.submit_feedback(77, FaxCategory::Billing, None, None),
            Err(ReviewError::NotFound(77))
        ));
    }

    #[test]
    fn test_queue_lists_categorized_without_text() {
        let (review, db) = setup();
        let a = add(&db, "a");
        add(&db, "b");
        review.approve(a, None).unwrap();

        let page = review.queue(None, None).unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|f| f.raw_text.is_none()));
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("Approve".parse::<ReviewAction>().unwrap(), ReviewAction::Approve);
        assert!("reject".parse::<ReviewAction>().is_err());
    }
}
