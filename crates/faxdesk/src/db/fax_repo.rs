//! Fax repository: CRUD operations for the `faxes` table.
//!
//! Functions taking a `&Connection` are meant to be composed inside
//! `Database::with_tx`; the `&Database` variants lock for a single call.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::fax::{FaxCategory, FaxRecord, FaxStatus, NewFax};

/// A raw fax row as stored.
#[derive(Debug, Clone)]
struct FaxRow {
    id: i64,
    filename: String,
    source_path: String,
    content_hash: String,
    status: String,
    ai_category: Option<String>,
    ai_confidence: Option<f64>,
    ai_reason: Option<String>,
    final_category: Option<String>,
    was_overridden: bool,
    override_reason: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    received_at: String,
    processed_at: Option<String>,
    raw_text: Option<String>,
    text_length: i64,
    summary: Option<String>,
    page_count: i64,
    is_urgent: bool,
    priority_score: i64,
    created_at: String,
    updated_at: String,
}

impl FaxRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            source_path: row.get("source_path")?,
            content_hash: row.get("content_hash")?,
            status: row.get("status")?,
            ai_category: row.get("ai_category")?,
            ai_confidence: row.get("ai_confidence")?,
            ai_reason: row.get("ai_reason")?,
            final_category: row.get("final_category")?,
            was_overridden: row.get("was_overridden")?,
            override_reason: row.get("override_reason")?,
            reviewed_by: row.get("reviewed_by")?,
            reviewed_at: row.get("reviewed_at")?,
            received_at: row.get("received_at")?,
            processed_at: row.get("processed_at")?,
            raw_text: row.get("raw_text")?,
            text_length: row.get("text_length")?,
            summary: row.get("summary")?,
            page_count: row.get("page_count")?,
            is_urgent: row.get("is_urgent")?,
            priority_score: row.get("priority_score")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<FaxRecord, DatabaseError> {
        Ok(FaxRecord {
            id: self.id,
            filename: self.filename,
            source_path: self.source_path,
            content_hash: self.content_hash,
            status: parse_status(&self.status)?,
            ai_category: parse_category("ai_category", self.ai_category)?,
            ai_confidence: self.ai_confidence,
            ai_reason: self.ai_reason,
            final_category: parse_category("final_category", self.final_category)?,
            was_overridden: self.was_overridden,
            override_reason: self.override_reason,
            reviewed_by: self.reviewed_by,
            reviewed_at: parse_optional_timestamp("reviewed_at", self.reviewed_at)?,
            received_at: parse_timestamp("received_at", &self.received_at)?,
            processed_at: parse_optional_timestamp("processed_at", self.processed_at)?,
            raw_text: self.raw_text,
            text_length: self.text_length,
            summary: self.summary,
            page_count: self.page_count,
            is_urgent: self.is_urgent,
            priority_score: self.priority_score,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_status(value: &str) -> Result<FaxStatus, DatabaseError> {
    value.parse().map_err(|_| DatabaseError::InvalidValue {
        column: "status".to_string(),
        value: value.to_string(),
    })
}

pub(crate) fn parse_category(
    column: &str,
    value: Option<String>,
) -> Result<Option<FaxCategory>, DatabaseError> {
    match value {
        None => Ok(None),
        Some(v) => FaxCategory::parse_loose(&v)
            .map(Some)
            .ok_or(DatabaseError::InvalidValue {
                column: column.to_string(),
                value: v,
            }),
    }
}

fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

/// Query filter parameters for fax listing.
#[derive(Debug, Default, Clone)]
pub struct FaxFilter {
    pub status: Option<FaxStatus>,
    /// Matches either the AI category or the reviewed category.
    pub category: Option<FaxCategory>,
    pub urgent_only: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new fax and returns the stored record.
///
/// A second insert with the same content hash fails with a UNIQUE
/// violation (see `DatabaseError::is_unique_violation`).
pub fn insert(db: &Database, fax: &NewFax) -> Result<FaxRecord, DatabaseError> {
    db.with_conn(|conn| {
        let now = format_timestamp(&Utc::now());
        conn.execute(
            "INSERT INTO faxes (filename, source_path, content_hash, status, ai_category,
             ai_confidence, ai_reason, raw_text, text_length, summary, page_count,
             is_urgent, priority_score, received_at, processed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                fax.filename,
                fax.source_path,
                fax.content_hash,
                fax.status.as_str(),
                fax.ai_category.as_str(),
                fax.ai_confidence,
                fax.ai_reason,
                fax.raw_text,
                fax.raw_text.chars().count() as i64,
                fax.summary,
                fax.page_count,
                fax.is_urgent,
                fax.priority_score,
                format_timestamp(&fax.received_at),
                format_timestamp(&fax.processed_at),
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        find_in(conn, id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    })
}

/// Finds a fax by id on an already locked connection.
pub fn find_in(conn: &Connection, id: i64) -> Result<Option<FaxRecord>, DatabaseError> {
    conn.query_row("SELECT * FROM faxes WHERE id = ?1", params![id], FaxRow::from_row)
        .optional()?
        .map(FaxRow::into_record)
        .transpose()
}

/// Finds a fax by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<FaxRecord>, DatabaseError> {
    db.with_conn(|conn| find_in(conn, id))
}

/// Finds a fax by its content hash.
pub fn find_by_hash(db: &Database, content_hash: &str) -> Result<Option<FaxRecord>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM faxes WHERE content_hash = ?1",
            params![content_hash],
            FaxRow::from_row,
        )
        .optional()?
        .map(FaxRow::into_record)
        .transpose()
    })
}

/// Queries faxes with filters, returning (rows, total_count).
///
/// Rows are ordered by priority (highest first), then by receive time
/// (newest first).
pub fn query(db: &Database, filter: &FaxFilter) -> Result<(Vec<FaxRecord>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.as_str()));
        }
        if let Some(category) = filter.category {
            let idx = param_values.len() + 1;
            conditions.push(format!("(ai_category = ?{idx} OR final_category = ?{idx})"));
            param_values.push(Box::new(category.as_str()));
        }
        if filter.urgent_only {
            conditions.push("is_urgent = 1".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM faxes {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(50) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM faxes {} ORDER BY priority_score DESC, received_at DESC, id DESC
             LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<FaxRow> = stmt
            .query_map(params_ref.as_slice(), FaxRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let records = rows
            .into_iter()
            .map(FaxRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total))
    })
}

/// Records an approval: the AI category becomes the final one.
pub fn mark_approved(
    conn: &Connection,
    id: i64,
    reviewer: Option<&str>,
    now: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let now = format_timestamp(now);
    Ok(conn.execute(
        "UPDATE faxes SET status = ?2, final_category = ai_category, was_overridden = 0,
         reviewed_by = ?3, reviewed_at = ?4, updated_at = ?4
         WHERE id = ?1",
        params![id, FaxStatus::Approved.as_str(), reviewer, now],
    )?)
}

/// Records an override with the reviewer's category and reason.
pub fn mark_overridden(
    conn: &Connection,
    id: i64,
    category: FaxCategory,
    reason: Option<&str>,
    reviewer: Option<&str>,
    now: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let now = format_timestamp(now);
    Ok(conn.execute(
        "UPDATE faxes SET status = ?2, final_category = ?3, was_overridden = 1,
         override_reason = ?4, reviewed_by = ?5, reviewed_at = ?6, updated_at = ?6
         WHERE id = ?1",
        params![
            id,
            FaxStatus::Overridden.as_str(),
            category.as_str(),
            reason,
            reviewer,
            now
        ],
    )?)
}

/// Updates only the status and updated_at of a fax. Returns affected rows.
pub fn update_status(
    db: &Database,
    id: i64,
    status: FaxStatus,
    now: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE faxes SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), format_timestamp(now)],
        )?)
    })
}

/// Deletes a fax and its feedback. Returns false when no such fax exists.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_tx(|tx| -> Result<bool, DatabaseError> {
        tx.execute("DELETE FROM fax_feedback WHERE fax_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM faxes WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    })
}
