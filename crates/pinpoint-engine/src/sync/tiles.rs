//! Tile definition create, update, duplicate and delete.

use pinpoint_common::model::{merge_patch, RESERVED_TILE_KEYS};
use pinpoint_common::{
    ConfigMap, Event, Layout, SizeBounds, Source, SyncError, TileDefinition, TileId, Validated,
    ValidationWarning,
};
use serde_json::Value;
use tracing::{debug, info};

use super::{check_id, check_reserved, TileSynchronizer};
use crate::cache::{DebounceKey, RecordKey};

impl TileSynchronizer {
    /// Create a tile with a generated id.
    pub fn create_tile(
        &self,
        tile_type: &str,
        config: ConfigMap,
        source: Source,
    ) -> Result<Validated<TileDefinition>, SyncError> {
        self.create_tile_with_id(TileId::generate(), tile_type, config, source)
    }

    /// Create a tile under a caller-chosen id.
    ///
    /// The type's default config is merged beneath `config`; `width` and
    /// `height` entries are clamped to the configured bounds.
    pub fn create_tile_with_id(
        &self,
        id: TileId,
        tile_type: &str,
        config: ConfigMap,
        source: Source,
    ) -> Result<Validated<TileDefinition>, SyncError> {
        check_id("id", id.as_str())?;
        if tile_type.trim().is_empty() {
            return Err(SyncError::validation("type", "must not be blank"));
        }
        check_reserved(&config, &RESERVED_TILE_KEYS)?;

        let mut merged = self
            .types
            .defaults_for(tile_type)
            .map_err(|e| SyncError::validation("type", e.to_string()))?;
        merge_patch(&mut merged, &config);
        let warnings = clamp_size_entries(&mut merged, &self.bounds())?;

        if self.cache.borrow().contains_tile(&id) {
            return Err(SyncError::validation(
                "id",
                format!("tile {id} already exists"),
            ));
        }

        let tile = TileDefinition::new(id, tile_type, merged);
        self.cache.borrow_mut().insert_tile(tile.clone());
        info!(tile = %tile.id, tile_type, %source, "tile created");

        self.emit(Event::TileCreated {
            tile: tile.clone(),
            source,
        });
        self.commit([RecordKey::Tile(tile.id.clone())]);
        Ok(Validated::with_warnings(tile, warnings))
    }

    /// Merge `patch` into a tile's config and schedule a debounced write.
    ///
    /// `tile:updated` goes out immediately. A patch that changes nothing
    /// emits nothing and writes nothing.
    pub fn update_tile(
        &self,
        id: &TileId,
        patch: ConfigMap,
        source: Source,
    ) -> Result<Validated<TileDefinition>, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("id", "must not be blank"));
        }
        check_reserved(&patch, &RESERVED_TILE_KEYS)?;
        let mut patch = patch;
        let warnings = clamp_size_entries(&mut patch, &self.bounds())?;

        let (changed, tile) = {
            let mut cache = self.cache.borrow_mut();
            let (changed, tile) = cache
                .update_tile_with(id, |tile| {
                    let changed = tile.apply_patch(&patch);
                    (changed, (changed, tile.clone()))
                })
                .ok_or_else(|| SyncError::TileNotFound(id.clone()))?;
            if changed {
                cache.schedule(DebounceKey::Tile(id.clone()));
            }
            (changed, tile)
        };

        if changed {
            debug!(tile = %id, %source, keys = patch.len(), "tile updated");
            self.emit(Event::TileUpdated {
                tile_id: id.clone(),
                patch,
                tile: tile.clone(),
                source,
            });
        } else {
            debug!(tile = %id, %source, "tile patch changed nothing");
        }
        Ok(Validated::with_warnings(tile, warnings))
    }

    /// Delete a tile and every instance of it.
    ///
    /// Emits one `tile:deleted`, then one `layout:updated` per layout that
    /// lost an instance.
    pub fn delete_tile(&self, id: &TileId, source: Source) -> Result<TileDefinition, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("id", "must not be blank"));
        }

        let (tile, layouts) = {
            let mut cache = self.cache.borrow_mut();
            let tile = cache
                .remove_tile(id)
                .ok_or_else(|| SyncError::TileNotFound(id.clone()))?;
            let affected = cache.remove_instances_of(id);
            let layouts: Vec<Layout> = affected
                .iter()
                .filter_map(|layout_id| cache.layout(layout_id).cloned())
                .collect();
            (tile, layouts)
        };
        info!(tile = %id, layouts = layouts.len(), %source, "tile deleted");

        self.emit(Event::TileDeleted {
            tile_id: id.clone(),
            source: source.clone(),
        });
        let mut records = vec![RecordKey::Tile(id.clone())];
        for layout in layouts {
            records.push(RecordKey::Layout(layout.id.clone()));
            self.emit(Event::LayoutUpdated {
                layout_id: layout.id.clone(),
                layout,
                source: source.clone(),
            });
        }
        self.commit(records);
        Ok(tile)
    }

    /// Copy a tile under a new id, prefixing its content with "Copy of ".
    pub fn duplicate_tile(
        &self,
        id: &TileId,
        source: Source,
    ) -> Result<Validated<TileDefinition>, SyncError> {
        let original = self
            .tile(id)
            .ok_or_else(|| SyncError::TileNotFound(id.clone()))?;
        let mut config = original.config.clone();
        if let Some(content) = original.content() {
            config.insert("content".into(), Value::from(format!("Copy of {content}")));
        }
        self.create_tile(&original.tile_type, config, source)
    }
}

/// Clamp integer `width`/`height` entries in a tile config or patch.
///
/// `null` is left alone so a patch can still remove the key.
fn clamp_size_entries(
    config: &mut ConfigMap,
    bounds: &SizeBounds,
) -> Result<Vec<ValidationWarning>, SyncError> {
    let mut warnings = Vec::new();
    for (field, min, max) in [
        ("width", bounds.min_width, bounds.max_width),
        ("height", bounds.min_height, bounds.max_height),
    ] {
        let Some(value) = config.get(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let requested = value
            .as_i64()
            .ok_or_else(|| SyncError::validation(field, "must be an integer"))?;
        let applied = requested.max(i64::from(min)).min(i64::from(max));
        if applied != requested {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                requested,
                applied,
            });
            config.insert(field.to_string(), Value::from(applied));
        }
    }
    Ok(warnings)
}
