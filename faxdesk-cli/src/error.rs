use faxdesk::{
    ConfigError, DatabaseError, FaxdeskError, GenerationError, IntakeError, ReviewError,
    WatcherError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] FaxdeskError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Watcher(#[from] WatcherError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type CliResult<T> = Result<T, CliError>;
