use serde::{Deserialize, Serialize};

use super::{ConfigMap, DisplayInfo, Record};
use crate::id::{InstanceId, LayoutId, TileId};
use crate::types::{Point, Size};

/// A placement of a tile definition inside one layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInstance {
    pub instance_id: InstanceId,
    pub tile_id: TileId,
    #[serde(flatten)]
    pub position: Point,
    #[serde(flatten)]
    pub size: Size,
}

impl TileInstance {
    pub fn new(tile_id: TileId, position: Point, size: Size) -> Self {
        Self {
            instance_id: InstanceId::generate(),
            tile_id,
            position,
            size,
        }
    }
}

/// Where a layout wants to be projected, plus an informational snapshot
/// of that display as it looked when last chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub target_display: usize,
    #[serde(default)]
    pub display_info: Option<DisplayInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: LayoutId,
    pub name: String,
    #[serde(default)]
    pub tile_instances: Vec<TileInstance>,
    #[serde(default)]
    pub display_settings: DisplaySettings,
    #[serde(default)]
    pub settings: ConfigMap,
}

impl Layout {
    pub fn new(id: LayoutId, name: impl Into<String>, target_display: usize) -> Self {
        Self {
            id,
            name: name.into(),
            tile_instances: Vec::new(),
            display_settings: DisplaySettings {
                target_display,
                display_info: None,
            },
            settings: ConfigMap::new(),
        }
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&TileInstance> {
        self.tile_instances.iter().find(|i| &i.instance_id == id)
    }

    pub fn instance_mut(&mut self, id: &InstanceId) -> Option<&mut TileInstance> {
        self.tile_instances.iter_mut().find(|i| &i.instance_id == id)
    }

    pub fn remove_instance(&mut self, id: &InstanceId) -> Option<TileInstance> {
        let pos = self.tile_instances.iter().position(|i| &i.instance_id == id)?;
        Some(self.tile_instances.remove(pos))
    }

    /// Drop every instance of `tile`, returning the removed instance ids.
    pub fn remove_instances_of(&mut self, tile: &TileId) -> Vec<InstanceId> {
        let mut removed = Vec::new();
        self.tile_instances.retain(|i| {
            if &i.tile_id == tile {
                removed.push(i.instance_id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn references(&self, tile: &TileId) -> bool {
        self.tile_instances.iter().any(|i| &i.tile_id == tile)
    }
}

impl Record for Layout {
    type Id = LayoutId;
    const KIND: &'static str = "layout";

    fn id(&self) -> &LayoutId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        let mut layout = Layout::new(LayoutId::from("layout_uuid"), "Layout Name", 0);
        layout.tile_instances.push(TileInstance {
            instance_id: InstanceId::from("inst_uuid"),
            tile_id: TileId::from("tile_uuid"),
            position: Point::new(100, 200),
            size: Size::new(250, 150),
        });
        layout
    }

    #[test]
    fn persisted_shape_matches_record_format() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["id"], "layout_uuid");
        assert_eq!(v["name"], "Layout Name");
        let inst = &v["tile_instances"][0];
        assert_eq!(inst["instance_id"], "inst_uuid");
        assert_eq!(inst["tile_id"], "tile_uuid");
        assert_eq!(inst["x"], 100);
        assert_eq!(inst["y"], 200);
        assert_eq!(inst["width"], 250);
        assert_eq!(inst["height"], 150);
        assert_eq!(v["display_settings"]["target_display"], 0);
    }

    #[test]
    fn parses_record_with_missing_optional_sections() {
        let raw = r#"{"id":"l1","name":"Empty"}"#;
        let layout: Layout = serde_json::from_str(raw).unwrap();
        assert!(layout.tile_instances.is_empty());
        assert_eq!(layout.display_settings.target_display, 0);
        assert!(layout.display_settings.display_info.is_none());
    }

    #[test]
    fn remove_instances_of_tile() {
        let mut layout = sample();
        layout
            .tile_instances
            .push(TileInstance::new(TileId::from("other"), Point::default(), Size::new(100, 100)));
        let removed = layout.remove_instances_of(&TileId::from("tile_uuid"));
        assert_eq!(removed, vec![InstanceId::from("inst_uuid")]);
        assert_eq!(layout.tile_instances.len(), 1);
        assert!(!layout.references(&TileId::from("tile_uuid")));
    }

    #[test]
    fn instance_lookup_and_removal() {
        let mut layout = sample();
        let id = InstanceId::from("inst_uuid");
        assert!(layout.instance(&id).is_some());
        layout.instance_mut(&id).unwrap().position = Point::new(5, 5);
        assert_eq!(layout.instance(&id).unwrap().position, Point::new(5, 5));
        assert!(layout.remove_instance(&id).is_some());
        assert!(layout.remove_instance(&id).is_none());
    }
}
