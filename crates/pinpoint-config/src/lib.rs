//! PinPoint configuration system.
//!
//! TOML-based configuration with full validation. All sections use
//! sensible defaults so partial configs work out of the box.

pub mod paths;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use paths::{config_dir, config_file, data_dir, resolve_data_dir};
pub use schema::{
    to_display_infos, DisplayConfig, LogLevel, LoggingConfig, PinpointConfig, StorageConfig,
    SyncConfig, TilesConfig, CONFIG_SCHEMA_VERSION,
};

use pinpoint_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<PinpointConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path and validate it.
pub fn load_config_from(path: &Path) -> Result<PinpointConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &PinpointConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
