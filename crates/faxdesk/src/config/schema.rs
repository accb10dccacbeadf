use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Process configuration, read once at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// When absent the settings store decides.
    #[serde(default)]
    pub watch_folder: Option<PathBuf>,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_stability_delay")]
    pub stability_delay_ms: u64,
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

impl ServiceConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn stability_delay(&self) -> Duration {
        Duration::from_millis(self.stability_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            watch_folder: None,
            scan_interval_secs: default_scan_interval(),
            stability_delay_ms: default_stability_delay(),
            stop_timeout_secs: default_stop_timeout(),
            generation: GenerationConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    crate::db::default_database_path().unwrap_or_else(|| PathBuf::from("faxdesk.db"))
}

fn default_scan_interval() -> u64 {
    10
}

fn default_stability_delay() -> u64 {
    500
}

fn default_stop_timeout() -> u64 {
    5
}

/// Local LLM used for categorization and summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}
