use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaxdeskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Failures of the text extraction collaborator.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A required external tool (OCR engine, PDF renderer) is missing.
    /// The message is shown to operators verbatim.
    #[error("{tool} is not available: {remediation}")]
    ToolUnavailable { tool: String, remediation: String },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    Pdf(String),

    #[error("Failed to process image: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),
}

impl ExtractError {
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, Self::ToolUnavailable { .. })
    }
}

/// Failures of the text generation collaborator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Cannot reach generation service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse generation response: {0}")]
    Response(String),

    #[error("Text generation is disabled")]
    Disabled,
}

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Failed to hash '{path}': {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] crate::db::DatabaseError),

    #[error("Unsupported file type '{0}': expected a PDF or TIFF file")]
    UnsupportedFile(String),
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Fax {0} not found")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free file name left for '{0}'")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watch folder '{path}': {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn watcher thread: {0}")]
    SpawnFailed(String),

    #[error("Failed to list watch folder '{path}': {reason}")]
    ScanFailed { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, FaxdeskError>;
