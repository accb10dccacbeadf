use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use faxdesk::{FaxCategory, FaxStatus, ReviewAction};

#[derive(Debug, Parser)]
#[command(name = "faxdesk", version, about = "Fax intake, categorization and review")]
pub struct Cli {
    /// JSON config file
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the watch folder until Ctrl-C
    Watch,
    /// Run one scan of the watch folder and exit
    Scan,
    /// Ingest a single PDF or TIFF file
    Ingest { file: PathBuf },
    /// List faxes
    List(ListArgs),
    /// Faxes waiting for review, most urgent first
    Queue(PageArgs),
    /// Show one fax including extracted text
    Show {
        id: i64,
        /// Include feedback records
        #[arg(long)]
        feedback: bool,
    },
    /// Accept the AI category
    Approve {
        id: i64,
        #[arg(long)]
        reviewer: Option<String>,
    },
    /// Replace the AI category
    Override {
        id: i64,
        #[arg(long)]
        category: FaxCategory,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        reviewer: Option<String>,
    },
    /// Approve or override several faxes
    Batch(BatchArgs),
    /// Mark a fax processed without review
    Process { id: i64 },
    /// Delete a fax and its feedback
    Delete { id: i64 },
    /// Record a category correction
    Feedback {
        id: i64,
        #[arg(long)]
        category: FaxCategory,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        by: Option<String>,
    },
    /// Aggregate statistics
    Stats,
    /// Review queue summary
    Summary,
    /// Read or change runtime settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// List the fax categories
    Categories,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long)]
    pub limit: Option<u64>,
    #[arg(long)]
    pub offset: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<FaxStatus>,
    #[arg(long)]
    pub category: Option<FaxCategory>,
    #[arg(long)]
    pub urgent: bool,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub action: ReviewAction,
    /// Required for override
    #[arg(long)]
    pub category: Option<FaxCategory>,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub reviewer: Option<String>,
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print typed settings, or one raw value
    Get { key: Option<String> },
    /// Store any key without validation
    Set { key: String, value: String },
    /// Validated update of the typed settings
    Update {
        #[arg(long)]
        watch_folder: Option<PathBuf>,
        #[arg(long)]
        auto_process: Option<bool>,
        #[arg(long)]
        require_review: Option<bool>,
        #[arg(long)]
        confidence_threshold: Option<f64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_parses_category_loosely() {
        let cli = Cli::try_parse_from([
            "faxdesk",
            "override",
            "7",
            "--category",
            "Lab Results",
        ])
        .unwrap();
        match cli.command {
            Command::Override { id, category, .. } => {
                assert_eq!(id, 7);
                assert_eq!(category, FaxCategory::LabResults);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_batch_requires_ids() {
        assert!(Cli::try_parse_from(["faxdesk", "batch", "--action", "approve"]).is_err());

        let cli =
            Cli::try_parse_from(["faxdesk", "batch", "--action", "approve", "1", "2"]).unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.action, ReviewAction::Approve);
                assert_eq!(args.ids, vec![1, 2]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["faxdesk", "stats", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["faxdesk", "list", "--status", "filed"]).is_err());
    }
}
