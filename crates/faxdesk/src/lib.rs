pub mod categorizer;
pub mod config;
pub mod db;
pub mod error;
pub mod fax;
pub mod generation;
pub mod intake;
pub mod processor;
pub mod review;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod urgency;
pub mod watcher;

pub use categorizer::{Categorization, Categorizer};
pub use config::{load_config, resolve_config, ServiceConfig};
pub use db::{Database, DatabaseError, FaxFilter};
pub use error::{
    ConfigError, ExtractError, FaxdeskError, GenerationError, IntakeError, Result, ReviewError,
    StorageError, WatcherError,
};
pub use fax::{FaxCategory, FaxRecord, FaxStatus, FeedbackRecord};
pub use generation::{DisabledGenerator, OllamaGenerator, TextGenerator};
pub use intake::{IntakeOutcome, IntakeProcessor};
pub use processor::{DocumentExtractor, ExtractedText, Extractor};
pub use review::{BatchOutcome, ReviewAction, ReviewOutcome, ReviewRequest, ReviewWorkflow};
pub use settings::{Settings, SettingsStore, SettingsUpdate};
pub use stats::{FaxStats, QueueSummary};
pub use storage::FileStorage;
pub use watcher::{FolderWatcher, ScanReport, WatcherEvent, WatcherOptions, WatcherStatus};
