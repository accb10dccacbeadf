use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of error messages kept in the watcher's error log.
pub const MAX_ERRORS: usize = 10;

/// Bounded error history; the oldest entry is dropped first.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: VecDeque<String>,
}

impl ErrorLog {
    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() == MAX_ERRORS {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

/// In-memory watcher state. Lives as long as the watcher.
#[derive(Debug, Default)]
pub struct WatcherState {
    pub is_running: bool,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub files_in_queue: usize,
    /// Files taken in or recognized as duplicates since the watcher was built.
    pub processed_count: usize,
    /// Fast-path cache of handled paths that are still in the watch folder.
    /// The content-hash check in the database stays authoritative.
    pub processed_files: HashSet<PathBuf>,
    pub errors: ErrorLog,
    pub currently_processing_file: Option<String>,
}

/// Point-in-time view of the watcher for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatcherStatus {
    pub is_running: bool,
    pub watch_folder: PathBuf,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub files_in_queue: usize,
    pub processed_files: usize,
    pub errors: Vec<String>,
    pub currently_processing_file: Option<String>,
}

impl WatcherState {
    pub fn snapshot(&self, watch_folder: PathBuf) -> WatcherStatus {
        WatcherStatus {
            is_running: self.is_running,
            watch_folder,
            last_scan_at: self.last_scan_at,
            files_in_queue: self.files_in_queue,
            processed_files: self.processed_count,
            errors: self.errors.to_vec(),
            currently_processing_file: self.currently_processing_file.clone(),
        }
    }
}
