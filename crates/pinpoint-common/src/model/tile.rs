use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{merge_patch, ConfigMap, Record};
use crate::id::TileId;
use crate::types::Size;

/// Keys owned by the record itself; patches may not touch them.
pub const RESERVED_TILE_KEYS: [&str; 4] = ["id", "type", "created_at", "updated_at"];

/// The durable, display-independent content and settings of one tile.
///
/// Type-specific settings (`content`, `width`, `height`, ...) are flattened
/// into the top level of the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: TileId,
    #[serde(rename = "type")]
    pub tile_type: String,
    #[serde(flatten)]
    pub config: ConfigMap,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TileDefinition {
    pub fn new(id: TileId, tile_type: impl Into<String>, config: ConfigMap) -> Self {
        let now = Utc::now();
        Self {
            id,
            tile_type: tile_type.into(),
            config,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.config.get("content").and_then(Value::as_str)
    }

    /// Preferred size for new instances, if the config carries one.
    pub fn preferred_size(&self) -> Option<Size> {
        let width = self.config.get("width")?.as_i64()?;
        let height = self.config.get("height")?.as_i64()?;
        Some(Size::new(saturate(width), saturate(height)))
    }

    /// Merge `patch` into the config, bumping `updated_at` if anything changed.
    pub fn apply_patch(&mut self, patch: &ConfigMap) -> bool {
        let changed = merge_patch(&mut self.config, patch);
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

impl Record for TileDefinition {
    type Id = TileId;
    const KIND: &'static str = "tile";

    fn id(&self) -> &TileId {
        &self.id
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN.into(), i32::MAX.into()) as i32
}
