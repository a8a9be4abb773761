//! Placing, moving, resizing and removing tile instances.

use pinpoint_common::validated::clamp_size;
use pinpoint_common::{
    Event, InstanceId, LayoutId, Point, Size, Source, SyncError, TileId, TileInstance, Validated,
};
use tracing::{debug, info, warn};

use super::TileSynchronizer;
use crate::cache::{DebounceKey, RecordKey};

impl TileSynchronizer {
    /// Place `tile` in a layout.
    ///
    /// Without an explicit size the tile's own `width`/`height` is used,
    /// then the configured default. The size is clamped either way.
    pub fn add_instance(
        &self,
        layout_id: &LayoutId,
        tile_id: &TileId,
        position: Point,
        size: Option<Size>,
        source: Source,
    ) -> Result<Validated<TileInstance>, SyncError> {
        let (instance, warnings, layout) = {
            let mut cache = self.cache.borrow_mut();
            if !cache.contains_layout(layout_id) {
                return Err(SyncError::LayoutNotFound(layout_id.clone()));
            }
            let mut instance = TileInstance::new(tile_id.clone(), position, Size::default());
            let Some(tile) = cache.tile(tile_id) else {
                return Err(SyncError::ReferentialIntegrity {
                    instance: instance.instance_id,
                    tile: tile_id.clone(),
                });
            };

            let requested = size
                .or_else(|| tile.preferred_size())
                .unwrap_or_else(|| self.tiles_config.default_size());
            let (size, warnings) = clamp_size(requested, &self.bounds());
            instance.size = size;

            if !cache.add_instance(layout_id, instance.clone()) {
                return Err(SyncError::validation(
                    "instance_id",
                    format!("instance {} already exists", instance.instance_id),
                ));
            }
            let layout = cache
                .layout(layout_id)
                .cloned()
                .ok_or_else(|| SyncError::LayoutNotFound(layout_id.clone()))?;
            (instance, warnings, layout)
        };

        for w in &warnings {
            warn!(instance = %instance.instance_id, "{w}");
        }
        info!(
            layout = %layout_id,
            instance = %instance.instance_id,
            tile = %tile_id,
            "instance added"
        );

        self.emit(Event::LayoutUpdated {
            layout_id: layout_id.clone(),
            layout,
            source,
        });
        self.commit([RecordKey::Layout(layout_id.clone())]);
        Ok(Validated::with_warnings(instance, warnings))
    }

    pub fn remove_instance(
        &self,
        id: &InstanceId,
        source: Source,
    ) -> Result<TileInstance, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("instance_id", "must not be blank"));
        }
        let (layout_id, instance, layout) = {
            let mut cache = self.cache.borrow_mut();
            let (layout_id, instance) = cache
                .remove_instance(id)
                .ok_or_else(|| SyncError::InstanceNotFound(id.clone()))?;
            let layout = cache
                .layout(&layout_id)
                .cloned()
                .ok_or_else(|| SyncError::LayoutNotFound(layout_id.clone()))?;
            (layout_id, instance, layout)
        };
        info!(layout = %layout_id, instance = %id, "instance removed");

        self.emit(Event::LayoutUpdated {
            layout_id: layout_id.clone(),
            layout,
            source,
        });
        self.commit([RecordKey::Layout(layout_id)]);
        Ok(instance)
    }

    /// Move an instance (editor coordinates). Debounced on the geometry window.
    pub fn move_instance(
        &self,
        id: &InstanceId,
        position: Point,
        source: Source,
    ) -> Result<TileInstance, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("instance_id", "must not be blank"));
        }
        let (layout_id, (changed, instance)) = {
            let mut cache = self.cache.borrow_mut();
            let (layout_id, (changed, instance)) = cache
                .update_instance_with(id, |instance| {
                    let changed = instance.position != position;
                    instance.position = position;
                    (changed, (changed, instance.clone()))
                })
                .ok_or_else(|| SyncError::InstanceNotFound(id.clone()))?;
            if changed {
                cache.schedule(DebounceKey::Instance(id.clone()));
            }
            (layout_id, (changed, instance))
        };

        if changed {
            debug!(instance = %id, %position, %source, "instance moved");
            self.emit(Event::InstanceMoved {
                layout_id,
                instance_id: id.clone(),
                position,
                source,
            });
        }
        Ok(instance)
    }

    /// Resize an instance, clamping to the configured bounds.
    pub fn resize_instance(
        &self,
        id: &InstanceId,
        size: Size,
        source: Source,
    ) -> Result<Validated<TileInstance>, SyncError> {
        if id.is_blank() {
            return Err(SyncError::validation("instance_id", "must not be blank"));
        }
        let (size, warnings) = clamp_size(size, &self.bounds());
        for w in &warnings {
            warn!(instance = %id, "{w}");
        }

        let (layout_id, (changed, instance)) = {
            let mut cache = self.cache.borrow_mut();
            let (layout_id, (changed, instance)) = cache
                .update_instance_with(id, |instance| {
                    let changed = instance.size != size;
                    instance.size = size;
                    (changed, (changed, instance.clone()))
                })
                .ok_or_else(|| SyncError::InstanceNotFound(id.clone()))?;
            if changed {
                cache.schedule(DebounceKey::Instance(id.clone()));
            }
            (layout_id, (changed, instance))
        };

        if changed {
            debug!(instance = %id, %size, %source, "instance resized");
            self.emit(Event::InstanceResized {
                layout_id,
                instance_id: id.clone(),
                size,
                source,
            });
        }
        Ok(Validated::with_warnings(instance, warnings))
    }
}
