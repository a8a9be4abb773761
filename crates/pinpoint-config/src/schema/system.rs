//! Storage location and logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where tile and layout records are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_defaults_to_info() {
        assert_eq!(LoggingConfig::default().level, LogLevel::Info);
        assert_eq!(LogLevel::Info.as_str(), "info");
    }

    #[test]
    fn log_level_parses_lowercase() {
        let config: LoggingConfig = toml::from_str(r#"level = "debug""#).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let result: Result<LoggingConfig, _> = toml::from_str(r#"level = "loud""#);
        assert!(result.is_err());
    }

    #[test]
    fn storage_data_dir_optional() {
        let config: StorageConfig = toml::from_str("").unwrap();
        assert!(config.data_dir.is_none());
        let config: StorageConfig = toml::from_str(r#"data_dir = "/tmp/pp""#).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/pp")));
    }
}
