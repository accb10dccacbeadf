//! Runtime settings stored in the database, with typed accessors.
//!
//! Values are strings on disk. Missing keys fall back to fixed defaults;
//! `watch_folder` falls back to `FAX_WATCH_FOLDER` and then `./fax_inbox`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::{settings_repo, Database, DatabaseError};
use crate::error::{ConfigError, Result};

pub const KEY_WATCH_FOLDER: &str = "watch_folder";
pub const KEY_AUTO_PROCESS: &str = "auto_process";
pub const KEY_REQUIRE_REVIEW: &str = "require_review";
pub const KEY_CONFIDENCE_THRESHOLD: &str = "confidence_threshold";

pub const WATCH_FOLDER_ENV: &str = "FAX_WATCH_FOLDER";
const FALLBACK_WATCH_FOLDER: &str = "./fax_inbox";

const DEFAULT_AUTO_PROCESS: bool = true;
const DEFAULT_REQUIRE_REVIEW: bool = true;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Resolved view of all typed settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub watch_folder: PathBuf,
    pub auto_process: bool,
    pub require_review: bool,
    pub confidence_threshold: f64,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub watch_folder: Option<PathBuf>,
    pub auto_process: Option<bool>,
    pub require_review: Option<bool>,
    pub confidence_threshold: Option<f64>,
}

/// Key/value settings backed by the `fax_settings` table.
#[derive(Clone)]
pub struct SettingsStore {
    db: Database,
    default_watch_folder: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            default_watch_folder: None,
        }
    }

    /// Uses `folder` instead of the environment when `watch_folder` is unset.
    pub fn with_default_watch_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.default_watch_folder = folder;
        self
    }

    pub fn get_raw(&self, key: &str) -> std::result::Result<Option<String>, DatabaseError> {
        settings_repo::get(&self.db, key)
    }

    /// Stores any key without validation.
    pub fn set(&self, key: &str, value: &str) -> std::result::Result<(), DatabaseError> {
        settings_repo::upsert(&self.db, key, value, None)
    }

    pub fn all_raw(&self) -> std::result::Result<Vec<settings_repo::SettingRow>, DatabaseError> {
        settings_repo::all(&self.db)
    }

    pub fn watch_folder(&self) -> std::result::Result<PathBuf, DatabaseError> {
        if let Some(value) = self.get_raw(KEY_WATCH_FOLDER)? {
            if !value.trim().is_empty() {
                return Ok(PathBuf::from(value));
            }
        }
        Ok(self.fallback_watch_folder())
    }

    fn fallback_watch_folder(&self) -> PathBuf {
        if let Some(folder) = &self.default_watch_folder {
            return folder.clone();
        }
        std::env::var(WATCH_FOLDER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_WATCH_FOLDER))
    }

    pub fn auto_process(&self) -> std::result::Result<bool, DatabaseError> {
        self.get_bool(KEY_AUTO_PROCESS, DEFAULT_AUTO_PROCESS)
    }

    pub fn require_review(&self) -> std::result::Result<bool, DatabaseError> {
        self.get_bool(KEY_REQUIRE_REVIEW, DEFAULT_REQUIRE_REVIEW)
    }

    pub fn confidence_threshold(&self) -> std::result::Result<f64, DatabaseError> {
        let value = self.get_raw(KEY_CONFIDENCE_THRESHOLD)?;
        Ok(value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD))
    }

    pub fn get(&self) -> std::result::Result<Settings, DatabaseError> {
        Ok(Settings {
            watch_folder: self.watch_folder()?,
            auto_process: self.auto_process()?,
            require_review: self.require_review()?,
            confidence_threshold: self.confidence_threshold()?,
        })
    }

    /// Applies a typed update and returns the resulting settings.
    ///
    /// The threshold is validated before anything is written.
    pub fn update(&self, update: &SettingsUpdate) -> Result<Settings> {
        if let Some(threshold) = update.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Validation {
                    message: format!(
                        "confidence_threshold must be between 0 and 1, got {}",
                        threshold
                    ),
                }
                .into());
            }
        }

        if let Some(folder) = &update.watch_folder {
            settings_repo::upsert(
                &self.db,
                KEY_WATCH_FOLDER,
                &folder.to_string_lossy(),
                Some("Folder polled for incoming faxes"),
            )?;
        }
        if let Some(auto) = update.auto_process {
            settings_repo::upsert(
                &self.db,
                KEY_AUTO_PROCESS,
                bool_str(auto),
                Some("Process new files automatically"),
            )?;
        }
        if let Some(review) = update.require_review {
            settings_repo::upsert(
                &self.db,
                KEY_REQUIRE_REVIEW,
                bool_str(review),
                Some("Require human review before filing"),
            )?;
        }
        if let Some(threshold) = update.confidence_threshold {
            settings_repo::upsert(
                &self.db,
                KEY_CONFIDENCE_THRESHOLD,
                &threshold.to_string(),
                Some("Minimum AI confidence considered reliable"),
            )?;
        }

        log::info!("Settings updated");
        Ok(self.get()?)
    }

    fn get_bool(&self, key: &str, default: bool) -> std::result::Result<bool, DatabaseError> {
        Ok(match self.get_raw(key)? {
            Some(v) => v.trim().eq_ignore_ascii_case("true"),
            None => default,
        })
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
