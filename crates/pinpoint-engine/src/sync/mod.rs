//! The public mutation API over the cache and the event bus.
//!
//! Every mutation carries a [`Source`]. Events are emitted after the cache
//! borrow is released, so handlers may call straight back into the
//! synchronizer. Structural changes (create, delete, add/remove instance)
//! are written at once; edits go through the debounce timers.

mod instances;
mod layouts;
mod persist;
mod tiles;


pub use layouts::LayoutPatch;
pub use persist::FlushSummary;

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use pinpoint_common::{
    ConfigMap, Event, EventBus, InstanceId, Layout, LayoutId, SizeBounds, SyncError,
    TileDefinition, TileId, TileInstance,
};
use pinpoint_config::TilesConfig;

use crate::cache::TileCache;
use crate::registry::TileTypeRegistry;

pub struct TileSynchronizer {
    cache: RefCell<TileCache>,
    bus: Rc<EventBus>,
    types: TileTypeRegistry,
    tiles_config: TilesConfig,
}

impl TileSynchronizer {
    pub fn new(
        cache: TileCache,
        bus: Rc<EventBus>,
        types: TileTypeRegistry,
        tiles_config: TilesConfig,
    ) -> Self {
        Self {
            cache: RefCell::new(cache),
            bus,
            types,
            tiles_config,
        }
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn types(&self) -> &TileTypeRegistry {
        &self.types
    }

    pub fn bounds(&self) -> SizeBounds {
        self.tiles_config.bounds()
    }

    /// Read-only view of the cache. Do not hold across a mutation.
    pub fn cache(&self) -> Ref<'_, TileCache> {
        self.cache.borrow()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tile(&self, id: &TileId) -> Option<TileDefinition> {
        self.cache.borrow().tile(id).cloned()
    }

    /// All tiles, oldest first.
    pub fn tiles(&self) -> Vec<TileDefinition> {
        let mut tiles: Vec<TileDefinition> = self.cache.borrow().tiles().cloned().collect();
        tiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tiles
    }

    pub fn layout(&self, id: &LayoutId) -> Option<Layout> {
        self.cache.borrow().layout(id).cloned()
    }

    /// All layouts, by name.
    pub fn layouts(&self) -> Vec<Layout> {
        let mut layouts: Vec<Layout> = self.cache.borrow().layouts().cloned().collect();
        layouts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        layouts
    }

    /// An instance and the layout that owns it.
    pub fn instance(&self, id: &InstanceId) -> Option<(LayoutId, TileInstance)> {
        self.cache
            .borrow()
            .instance(id)
            .map(|(layout_id, instance)| (layout_id.clone(), instance.clone()))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.cache.borrow().next_deadline()
    }

    pub fn pending_writes(&self) -> usize {
        self.cache.borrow().pending_writes()
    }

    fn emit(&self, event: Event) {
        self.bus.emit(event);
    }
}

/// Reject patches that touch fields the record owns.
fn check_reserved(patch: &ConfigMap, reserved: &[&str]) -> Result<(), SyncError> {
    match patch.keys().find(|k| reserved.contains(&k.as_str())) {
        Some(key) => Err(SyncError::validation(key.as_str(), "field cannot be patched")),
        None => Ok(()),
    }
}

/// Ids become file names in the JSON store.
fn check_id(field: &str, id: &str) -> Result<(), SyncError> {
    if id.trim().is_empty() {
        return Err(SyncError::validation(field, "must not be blank"));
    }
    if id.starts_with('.') || id.contains(['/', '\\', '\0']) {
        return Err(SyncError::validation(
            field,
            "must not start with '.' or contain path separators",
        ));
    }
    Ok(())
}
