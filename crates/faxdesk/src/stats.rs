//! Read-only aggregates over stored faxes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::stats_repo::{self, TimeColumn};
use crate::db::{Database, DatabaseError};
use crate::fax::{FaxCategory, FaxStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaxStats {
    pub total: u64,
    /// Every status is present, zero when unused.
    pub by_status: BTreeMap<FaxStatus, u64>,
    pub by_category: BTreeMap<FaxCategory, u64>,
    pub total_reviewed: u64,
    /// Percentage of reviewed faxes approved as categorized.
    pub accuracy_rate: f64,
    pub processed_today: u64,
    pub processed_this_week: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSummary {
    pub pending_review: u64,
    pub urgent_count: u64,
    pub today_received: u64,
    pub today_processed: u64,
    pub avg_processing_minutes: Option<f64>,
}

pub fn fax_stats(db: &Database) -> Result<FaxStats, DatabaseError> {
    fax_stats_at(db, Utc::now())
}

pub fn fax_stats_at(db: &Database, now: DateTime<Utc>) -> Result<FaxStats, DatabaseError> {
    let mut by_status: BTreeMap<FaxStatus, u64> =
        FaxStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for (status, n) in stats_repo::status_counts(db)? {
        by_status.insert(status, n);
    }

    let by_category = stats_repo::category_counts(db)?.into_iter().collect();

    let approved = by_status[&FaxStatus::Approved];
    let overridden = by_status[&FaxStatus::Overridden];
    let total_reviewed = approved + overridden;

    let today = start_of_day(now);
    let week = today - Duration::days(7);

    Ok(FaxStats {
        total: stats_repo::total(db)?,
        by_status,
        by_category,
        total_reviewed,
        accuracy_rate: accuracy_rate(approved, total_reviewed),
        processed_today: stats_repo::count_since(db, TimeColumn::ReviewedAt, &today)?,
        processed_this_week: stats_repo::count_since(db, TimeColumn::ReviewedAt, &week)?,
    })
}

pub fn queue_summary(db: &Database) -> Result<QueueSummary, DatabaseError> {
    queue_summary_at(db, Utc::now())
}

pub fn queue_summary_at(db: &Database, now: DateTime<Utc>) -> Result<QueueSummary, DatabaseError> {
    let today = start_of_day(now);

    Ok(QueueSummary {
        pending_review: stats_repo::count_with_status(db, FaxStatus::Categorized, false)?,
        urgent_count: stats_repo::count_with_status(db, FaxStatus::Categorized, true)?,
        today_received: stats_repo::count_since(db, TimeColumn::ReceivedAt, &today)?,
        today_processed: stats_repo::count_since(db, TimeColumn::ReviewedAt, &today)?,
        avg_processing_minutes: stats_repo::average_review_minutes(db)?,
    })
}

fn accuracy_rate(approved: u64, reviewed: u64) -> f64 {
    if reviewed == 0 {
        return 0.0;
    }
    approved as f64 / reviewed as f64 * 100.0
}

/// UTC midnight of the day containing `now`.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fax_repo::{self, tests::sample_fax};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_stats() {
        let db = Database::open_in_memory().unwrap();
        let stats = fax_stats(&db).unwrap();

        assert_eq!(stats.total, 0);
        assert_eq!(stats.accuracy_rate, 0.0);
        assert_eq!(stats.by_status.len(), FaxStatus::ALL.len());
        assert!(stats.by_status.values().all(|n| *n == 0));
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn test_accuracy_rate() {
        assert_eq!(accuracy_rate(3, 4), 75.0);
        assert_eq!(accuracy_rate(0, 0), 0.0);
        assert_eq!(accuracy_rate(0, 2), 0.0);
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(at(2026, 3, 4, 17)), at(2026, 3, 4, 0));
    }

    #[test]
    fn test_review_windows() {
        let db = Database::open_in_memory().unwrap();
        let now = at(2026, 3, 10, 15);

        let reviewed = [
            ("a", at(2026, 3, 10, 9)),
            ("b", at(2026, 3, 5, 9)),
            ("c", at(2026, 2, 1, 9)),
        ];
        for (hash, when) in reviewed {
            let fax = fax_repo::insert(&db, &sample_fax(hash)).unwrap();
            db.with_conn(|conn| fax_repo::mark_approved(conn, fax.id, None, &when))
                .unwrap();
        }
        fax_repo::insert(&db, &sample_fax("d")).unwrap();

        let stats = fax_stats_at(&db, now).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.total_reviewed, 3);
        assert_eq!(stats.accuracy_rate, 100.0);
        assert_eq!(stats.processed_today, 1);
        assert_eq!(stats.processed_this_week, 2);
        assert_eq!(stats.by_status[&FaxStatus::Categorized], 1);
        assert_eq!(stats.by_category[&FaxCategory::Billing], 4);

        let summary = queue_summary_at(&db, now).unwrap();
        assert_eq!(summary.pending_review, 1);
        assert_eq!(summary.urgent_count, 0);
        assert_eq!(summary.today_processed, 1);
        assert!(summary.avg_processing_minutes.is_some());
    }
}
