//! Settings repository: key/value rows in `fax_settings`.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{format_timestamp, Database, DatabaseError};

/// A stored setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingRow {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub updated_at: String,
}

/// Returns every stored setting ordered by key.
pub fn all(db: &Database) -> Result<Vec<SettingRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT key, value, description, updated_at FROM fax_settings ORDER BY key",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SettingRow {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    description: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns the raw value for `key`, or `None` when absent or NULL.
pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let value: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM fax_settings WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    })
}

/// Inserts or replaces the value for `key`. A `None` description keeps the
/// stored one.
pub fn upsert(
    db: &Database,
    key: &str,
    value: &str,
    description: Option<&str>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO fax_settings (key, value, description, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               description = COALESCE(excluded.description, description),
               updated_at = excluded.updated_at",
            params![key, value, description, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    })
}
