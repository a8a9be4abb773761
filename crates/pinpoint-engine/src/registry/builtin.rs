//! Tile types that ship with the engine.

use pinpoint_common::ConfigMap;
use semver::{Version, VersionReq};
use serde_json::{json, Value};

use super::{TileTypeDescriptor, TileTypeProvider};

pub struct BuiltinTileType {
    tile_type: &'static str,
    name: &'static str,
    category: &'static str,
    default_config: Value,
    capabilities: &'static [&'static str],
}

impl TileTypeProvider for BuiltinTileType {
    fn descriptor(&self) -> TileTypeDescriptor {
        TileTypeDescriptor {
            tile_type: self.tile_type.to_string(),
            name: self.name.to_string(),
            category: self.category.to_string(),
            version: Version::new(1, 0, 0),
            requires_core: VersionReq::parse("^1").unwrap_or(VersionReq::STAR),
            default_config: self
                .default_config
                .as_object()
                .cloned()
                .unwrap_or_else(ConfigMap::new),
            capabilities: self.capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub fn builtin_types() -> Vec<BuiltinTileType> {
    vec![
        BuiltinTileType {
            tile_type: "note",
            name: "Text Note",
            category: "Productivity",
            default_config: json!({ "content": "", "font_size": 14, "font_family": "Arial" }),
            capabilities: &["editable", "resizable", "exportable"],
        },
        BuiltinTileType {
            tile_type: "clock",
            name: "Clock",
            category: "Utility",
            default_config: json!({ "format": "HH:mm:ss", "timezone": "local" }),
            capabilities: &["resizable"],
        },
        BuiltinTileType {
            tile_type: "weather",
            name: "Weather",
            category: "Information",
            default_config: json!({ "location": "", "units": "metric" }),
            capabilities: &["resizable", "refreshable"],
        },
        BuiltinTileType {
            tile_type: "todo",
            name: "Todo List",
            category: "Productivity",
            default_config: json!({ "tasks": [], "show_completed": true }),
            capabilities: &["editable", "resizable", "exportable"],
        },
    ]
}
