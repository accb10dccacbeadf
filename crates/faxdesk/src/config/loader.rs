use std::path::{Path, PathBuf};

use crate::config::schema::ServiceConfig;
use crate::error::ConfigError;
use crate::settings::WATCH_FOLDER_ENV;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub const DATABASE_ENV: &str = "FAXDESK_DATABASE";
pub const LLM_URL_ENV: &str = "FAXDESK_LLM_URL";
pub const LLM_MODEL_ENV: &str = "FAXDESK_LLM_MODEL";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ServiceConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: ServiceConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads `path` when given, otherwise starts from defaults, then applies
/// environment overrides and validates the result.
pub fn resolve_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Overrides config values from `FAXDESK_DATABASE`, `FAX_WATCH_FOLDER`,
/// `FAXDESK_LLM_URL` and `FAXDESK_LLM_MODEL`. Empty values are ignored.
pub fn apply_env_overrides(config: &mut ServiceConfig) {
    if let Some(value) = env_value(DATABASE_ENV) {
        config.database_path = PathBuf::from(value);
    }
    if let Some(value) = env_value(WATCH_FOLDER_ENV) {
        config.watch_folder = Some(PathBuf::from(value));
    }
    if let Some(value) = env_value(LLM_URL_ENV) {
        config.generation.base_url = value;
    }
    if let Some(value) = env_value(LLM_MODEL_ENV) {
        config.generation.model = value;
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    if config.scan_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "scan_interval_secs must be at least 1".to_string(),
        });
    }

    let url = &config.generation.base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("generation.base_url must be an http(s) URL, got '{}'", url),
        });
    }

    if config.generation.model.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "generation.model must not be empty".to_string(),
        });
    }

    if config.ocr.languages.iter().any(|l| l.trim().is_empty()) {
        return Err(ConfigError::Validation {
            message: "ocr.languages must not contain empty entries".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "database_path": "/var/lib/faxdesk/fax.db",
            "watch_folder": "/srv/fax/in",
            "scan_interval_secs": 30,
            "generation": {
                "base_url": "http://llm.local:11434",
                "model": "mistral",
                "timeout_secs": 60
            },
            "ocr": { "languages": ["eng", "deu"] }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/faxdesk/fax.db"));
        assert_eq!(config.watch_folder, Some(PathBuf::from("/srv/fax/in")));
        assert_eq!(config.scan_interval_secs, 30);
        assert_eq!(config.stability_delay_ms, 500);
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.ocr.languages, vec!["eng", "deu"]);
    }

    #[test]
    fn test_unknown_field_fails_schema() {
        let result = load_config_from_str(r#"{ "worker_count": 4 }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_zero_interval_fails_schema() {
        let result = load_config_from_str(r#"{ "scan_interval_secs": 0 }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_non_http_url_fails_validation() {
        let result = load_config_from_str(r#"{ "generation": { "base_url": "ftp://x" } }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/faxdesk.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(DATABASE_ENV, "/tmp/override.db");
        std::env::set_var(LLM_MODEL_ENV, "phi3");
        std::env::set_var(LLM_URL_ENV, "  ");

        let config = resolve_config(None);

        std::env::remove_var(DATABASE_ENV);
        std::env::remove_var(LLM_MODEL_ENV);
        std::env::remove_var(LLM_URL_ENV);

        let config = config.unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.generation.model, "phi3");
        assert_eq!(config.generation.base_url, "http://localhost:11434");
    }

    #[test]
    #[serial]
    fn test_resolve_from_file() {
        std::env::remove_var(WATCH_FOLDER_ENV);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faxdesk.json");
        std::fs::write(&path, r#"{ "stop_timeout_secs": 2 }"#).unwrap();

        let config = resolve_config(Some(&path)).unwrap();
        assert_eq!(config.stop_timeout_secs, 2);
        assert!(config.watch_folder.is_none());
    }
}
