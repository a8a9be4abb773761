use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect};

/// One connected display as last enumerated. Never authoritative on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub index: usize,
    #[serde(default)]
    pub name: String,
    pub geometry: Rect,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub is_primary: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl DisplayInfo {
    pub fn origin(&self) -> Point {
        self.geometry.origin()
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.geometry.width, self.geometry.height)
    }

    /// Human-readable label, e.g. `Display 1 (1920x1080) (Primary)`.
    pub fn display_name(&self) -> String {
        let primary = if self.is_primary { " (Primary)" } else { "" };
        format!("{} ({}){primary}", self.name, self.resolution())
    }
}
