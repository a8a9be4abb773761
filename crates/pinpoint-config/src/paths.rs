//! Platform directory resolution for PinPoint.

use pinpoint_common::ConfigError;
use std::path::PathBuf;

pub(crate) const APP_NAME: &str = "pinpoint";

/// Returns the platform-specific configuration directory.
///
/// - macOS: `~/Library/Application Support/pinpoint`
/// - Linux: `$XDG_CONFIG_HOME/pinpoint` (defaults to `~/.config/pinpoint`)
/// - Windows: `%APPDATA%\pinpoint`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?
        .join(APP_NAME))
}

/// Returns the platform-specific data directory, where tiles and layouts live.
///
/// - macOS: `~/Library/Application Support/pinpoint`
/// - Linux: `$XDG_DATA_HOME/pinpoint` (defaults to `~/.local/share/pinpoint`)
/// - Windows: `%APPDATA%\pinpoint`
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::data_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine data directory".into()))?
        .join(APP_NAME))
}

/// Returns the path to the main configuration file.
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Data directory to use for a loaded config: the override if set,
/// otherwise the platform default.
pub fn resolve_data_dir(config: &crate::PinpointConfig) -> Result<PathBuf, ConfigError> {
    match &config.storage.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => data_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_has_correct_name() {
        let path = config_file().unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "config.toml");
        assert!(path.parent().unwrap().ends_with("pinpoint"));
    }

    #[test]
    fn data_dir_ends_with_pinpoint() {
        let path = data_dir().unwrap();
        assert!(path.ends_with("pinpoint"), "got: {path:?}");
    }

    #[test]
    fn override_wins_over_platform_dir() {
        let mut config = crate::PinpointConfig::default();
        config.storage.data_dir = Some(PathBuf::from("/tmp/pinpoint-data"));
        assert_eq!(
            resolve_data_dir(&config).unwrap(),
            PathBuf::from("/tmp/pinpoint-data")
        );
    }
}
