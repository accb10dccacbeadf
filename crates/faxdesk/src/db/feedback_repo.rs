//! Feedback repository for the `fax_feedback` table.

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use super::fax_repo::parse_category;
use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::fax::{FaxCategory, FeedbackRecord, NewFeedback};

struct FeedbackRow {
    id: i64,
    fax_id: i64,
    ai_category: String,
    correct_category: String,
    feedback_text: Option<String>,
    submitted_by: Option<String>,
    created_at: String,
}

impl FeedbackRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            fax_id: row.get("fax_id")?,
            ai_category: row.get("ai_category")?,
            correct_category: row.get("correct_category")?,
            feedback_text: row.get("feedback_text")?,
            submitted_by: row.get("submitted_by")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_record(self) -> Result<FeedbackRecord, DatabaseError> {
        Ok(FeedbackRecord {
            id: self.id,
            fax_id: self.fax_id,
            ai_category: required_category("ai_category", self.ai_category)?,
            correct_category: required_category("correct_category", self.correct_category)?,
            feedback_text: self.feedback_text,
            submitted_by: self.submitted_by,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

fn required_category(column: &str, value: String) -> Result<FaxCategory, DatabaseError> {
    Ok(parse_category(column, Some(value))?.unwrap_or(FaxCategory::Unknown))
}

/// Inserts a feedback record on an already locked connection.
pub fn insert_in(conn: &Connection, feedback: &NewFeedback) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO fax_feedback (fax_id, ai_category, correct_category, feedback_text,
         submitted_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            feedback.fax_id,
            feedback.ai_category.as_str(),
            feedback.correct_category.as_str(),
            feedback.feedback_text,
            feedback.submitted_by,
            format_timestamp(&Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a feedback record and returns its id.
pub fn insert(db: &Database, feedback: &NewFeedback) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| insert_in(conn, feedback))
}

/// Lists feedback for one fax, oldest first.
pub fn list_for_fax(db: &Database, fax_id: i64) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM fax_feedback WHERE fax_id = ?1 ORDER BY id ASC")?;
        let rows: Vec<FeedbackRow> = stmt
            .query_map(params![fax_id], FeedbackRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(FeedbackRow::into_record).collect()
    })
}

/// Counts feedback records, optionally for a single fax.
pub fn count(db: &Database, fax_id: Option<i64>) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let total: u64 = match fax_id {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM fax_feedback WHERE fax_id = ?1",
                params![id],
                |r| r.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM fax_feedback", [], |r| r.get(0))?,
        };
        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fax_repo;

    fn feedback_for(fax_id: i64) -> NewFeedback {
        NewFeedback {
            fax_id,
            ai_category: FaxCategory::Billing,
            correct_category: FaxCategory::Insurance,
            feedback_text: Some("EOB, not an invoice".to_string()),
            submitted_by: Some("bob".to_string()),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        let fax = fax_repo::insert(&db, &fax_repo::tests::sample_fax("fb")).unwrap();

        insert(&db, &feedback_for(fax.id)).unwrap();
        insert(&db, &feedback_for(fax.id)).unwrap();

        let list = list_for_fax(&db, fax.id).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].ai_category, FaxCategory::Billing);
        assert_eq!(list[0].correct_category, FaxCategory::Insurance);
        assert_eq!(list[0].submitted_by.as_deref(), Some("bob"));
        assert!(list[0].id < list[1].id);
    }

    #[test]
    fn test_count_scoped_and_total() {
        let db = Database::open_in_memory().unwrap();
        let a = fax_repo::insert(&db, &fax_repo::tests::sample_fax("a")).unwrap();
        let b = fax_repo::insert(&db, &fax_repo::tests::sample_fax("b")).unwrap();

        insert(&db, &feedback_for(a.id)).unwrap();
        insert(&db, &feedback_for(b.id)).unwrap();
        insert(&db, &feedback_for(b.id)).unwrap();

        assert_eq!(count(&db, None).unwrap(), 3);
        assert_eq!(count(&db, Some(b.id)).unwrap(), 2);
    }

    #[test]
    fn test_feedback_removed_with_fax() {
        let db = Database::open_in_memory().unwrap();
        let fax = fax_repo::insert(&db, &fax_repo::tests::sample_fax("gone")).unwrap();
        insert(&db, &feedback_for(fax.id)).unwrap();

        fax_repo::delete(&db, fax.id).unwrap();
        assert_eq!(count(&db, None).unwrap(), 0);
    }

    #[test]
    fn test_insert_for_missing_fax_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(insert(&db, &feedback_for(404)).is_err());
    }
}
