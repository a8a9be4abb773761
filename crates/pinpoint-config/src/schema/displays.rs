//! Display configuration for headless runs.
//!
//! Without a windowing backend the display topology comes from here.

use pinpoint_common::{DisplayInfo, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Scale factor (valid range: 0.5-4.0).
    pub scale: f64,
    pub primary: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            name: "Display 1".into(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            scale: 1.0,
            primary: true,
        }
    }
}

/// Turn configured displays into enumerated `DisplayInfo`s, indexed in order.
pub fn to_display_infos(displays: &[DisplayConfig]) -> Vec<DisplayInfo> {
    displays
        .iter()
        .enumerate()
        .map(|(index, d)| DisplayInfo {
            index,
            name: d.name.clone(),
            geometry: Rect::new(d.x, d.y, d.width, d.height),
            scale: d.scale,
            is_primary: d.primary,
        })
        .collect()
}

pub(crate) fn default_displays() -> Vec<DisplayConfig> {
    vec![DisplayConfig::default()]
}
