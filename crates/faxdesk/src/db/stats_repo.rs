//! Aggregate queries over the `faxes` table.

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::fax_repo::parse_category;
use super::{format_timestamp, Database, DatabaseError};
use crate::fax::{FaxCategory, FaxStatus};

/// Timestamp column used for windowed counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumn {
    ReceivedAt,
    ReviewedAt,
}

impl TimeColumn {
    fn column(&self) -> &'static str {
        match self {
            Self::ReceivedAt => "received_at",
            Self::ReviewedAt => "reviewed_at",
        }
    }
}

/// Total number of faxes.
pub fn total(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM faxes", [], |r| r.get(0))?))
}

/// Counts per stored status. Statuses without rows are absent.
pub fn status_counts(db: &Database) -> Result<Vec<(FaxStatus, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM faxes GROUP BY status")?;
        let rows: Vec<(String, u64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(status, n)| {
                let parsed = status.parse().map_err(|_| DatabaseError::InvalidValue {
                    column: "status".to_string(),
                    value: status,
                })?;
                Ok((parsed, n))
            })
            .collect()
    })
}

/// Counts per effective category: the reviewed category when present,
/// otherwise the AI category. Rows with neither are skipped.
pub fn category_counts(db: &Database) -> Result<Vec<(FaxCategory, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT COALESCE(final_category, ai_category) AS category, COUNT(*)
             FROM faxes
             WHERE COALESCE(final_category, ai_category) IS NOT NULL
             GROUP BY category
             ORDER BY category",
        )?;
        let rows: Vec<(String, u64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(rows.len());
        for (category, n) in rows {
            if let Some(parsed) = parse_category("category", Some(category))? {
                counts.push((parsed, n));
            }
        }
        Ok(counts)
    })
}

/// Counts faxes whose `column` timestamp is at or after `since`.
pub fn count_since(
    db: &Database,
    column: TimeColumn,
    since: &DateTime<Utc>,
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!(
            "SELECT COUNT(*) FROM faxes WHERE {col} IS NOT NULL AND {col} >= ?1",
            col = column.column()
        );
        Ok(conn.query_row(&sql, params![format_timestamp(since)], |r| r.get(0))?)
    })
}

/// Counts faxes in `status`, optionally only the urgent ones.
pub fn count_with_status(
    db: &Database,
    status: FaxStatus,
    urgent_only: bool,
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let sql = if urgent_only {
            "SELECT COUNT(*) FROM faxes WHERE status = ?1 AND is_urgent = 1"
        } else {
            "SELECT COUNT(*) FROM faxes WHERE status = ?1"
        };
        Ok(conn.query_row(sql, params![status.as_str()], |r| r.get(0))?)
    })
}

/// Mean minutes between receipt and review, over reviewed faxes only.
pub fn average_review_minutes(db: &Database) -> Result<Option<f64>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn.query_row(
            "SELECT AVG((julianday(reviewed_at) - julianday(received_at)) * 1440.0)
             FROM faxes WHERE reviewed_at IS NOT NULL",
            [],
            |r| r.get(0),
        )?)
    })
}
