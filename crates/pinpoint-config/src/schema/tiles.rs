//! Tile sizing configuration.

use pinpoint_common::{Size, SizeBounds};
use serde::{Deserialize, Serialize};

/// Default and permitted tile sizes, in editor pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesConfig {
    pub default_width: i32,
    pub default_height: i32,
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl TilesConfig {
    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }

    pub fn bounds(&self) -> SizeBounds {
        SizeBounds {
            min_width: self.min_width,
            max_width: self.max_width,
            min_height: self.min_height,
            max_height: self.max_height,
        }
    }
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            default_width: 250,
            default_height: 150,
            min_width: 100,
            max_width: 600,
            min_height: 80,
            max_height: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_config_defaults() {
        let config = TilesConfig::default();
        assert_eq!(config.default_size(), Size::new(250, 150));
        assert_eq!(config.bounds(), SizeBounds::default());
    }

    #[test]
    fn tiles_config_partial_toml() {
        let config: TilesConfig = toml::from_str("max_width = 900").unwrap();
        assert_eq!(config.max_width, 900);
        assert_eq!(config.min_width, 100);
    }
}
