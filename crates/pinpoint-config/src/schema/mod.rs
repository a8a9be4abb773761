//! Configuration schema types for PinPoint.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod displays;
mod sync;
mod system;
mod tiles;

pub use displays::*;
pub use sync::*;
pub use system::*;
pub use tiles::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for PinPoint.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinpointConfig {
    pub sync: SyncConfig,
    pub tiles: TilesConfig,
    pub storage: StorageConfig,
    pub displays: Vec<DisplayConfig>,
    pub logging: LoggingConfig,
}

impl Default for PinpointConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            tiles: TilesConfig::default(),
            storage: StorageConfig::default(),
            displays: displays::default_displays(),
            logging: LoggingConfig::default(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
