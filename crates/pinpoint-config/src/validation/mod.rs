//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod displays;
mod helpers;
mod sync;
mod tiles;


use crate::schema::PinpointConfig;
use pinpoint_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PinpointConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sync::validate_sync(&mut errors, config);
    tiles::validate_tiles(&mut errors, config);
    displays::validate_displays(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
