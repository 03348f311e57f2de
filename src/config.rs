//! Configuration management for be-quiet.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet scope configuration.
    pub quiet: QuietSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Quiet scope configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietSection {
    /// Start with interception disabled.
    pub disabled: bool,
    /// Lines kept in the messages log; `null` keeps every line.
    pub message_log_max: Option<usize>,
}

impl Default for QuietSection {
    fn default() -> Self {
        Self {
            disabled: false,
            message_log_max: Some(crate::host::DEFAULT_MESSAGE_LOG_MAX),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("BE_QUIET_DISABLE") {
            self.quiet.disabled = parse_flag(&value);
        }

        if let Ok(level) = std::env::var("BE_QUIET_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if args.loud {
            self.quiet.disabled = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Push the settings into the process-wide quiet state and the host of
    /// the calling thread.
    pub fn apply(&self) {
        crate::quiet::set_disabled(self.quiet.disabled);
        crate::host::set_message_log_max(self.quiet.message_log_max);
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.quiet.disabled);
        assert_eq!(config.quiet.message_log_max, Some(1000));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "quiet": { "disabled": true },
            "logging": { "level": "debug" }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.quiet.disabled);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "logging": { "level": "trace" } }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.quiet.disabled); // Default
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_config_message_log_max() {
        let config: Config =
            serde_json::from_str(r#"{ "quiet": { "message_log_max": 50 } }"#).unwrap();
        assert_eq!(config.quiet.message_log_max, Some(50));

        let config: Config =
            serde_json::from_str(r#"{ "quiet": { "message_log_max": null } }"#).unwrap();
        assert_eq!(config.quiet.message_log_max, None);
    }

    #[test]
    #[serial]
    fn test_apply_sets_message_log_max() {
        let mut config = Config::default();
        config.quiet.message_log_max = Some(7);
        config.apply();
        assert_eq!(crate::host::message_log_max(), Some(7));
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::from_file(&PathBuf::from("/nonexistent/be-quiet.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            loud: true,
            log_level: Some("info".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert!(config.quiet.disabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("no"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"disabled\""));
        assert!(json.contains("\"level\""));
    }
}
