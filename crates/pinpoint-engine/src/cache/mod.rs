//! Authoritative in-memory mirror of tiles and layouts.
//!
//! The cache is the only writer to the stores. Mutations mark a record
//! dirty; content edits are written after a debounce window, structural
//! changes are written at once via [`TileCache::commit`]. The cache emits
//! no events itself.

mod flush;
mod scheduler;

#[cfg(test)]
mod tests;

pub use scheduler::{DebounceKey, Window};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pinpoint_common::{
    InstanceId, Layout, LayoutId, StorageError, TileDefinition, TileId, TileInstance,
};
use pinpoint_config::SyncConfig;
use pinpoint_store::Stores;

use crate::clock::Clock;
use scheduler::{DebounceScheduler, Timer};

/// A persisted record, as the stores know it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Tile(TileId),
    Layout(LayoutId),
}

impl RecordKey {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordKey::Tile(_) => "tile",
            RecordKey::Layout(_) => "layout",
        }
    }

    pub fn id(&self) -> String {
        match self {
            RecordKey::Tile(id) => id.to_string(),
            RecordKey::Layout(id) => id.to_string(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Debounce windows and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePolicy {
    pub content_window: Duration,
    pub geometry_window: Duration,
    pub retry_backoff_max: Duration,
    pub failure_threshold: u32,
}

impl WritePolicy {
    pub fn window(&self, window: Window) -> Duration {
        match window {
            Window::Content => self.content_window,
            Window::Geometry => self.geometry_window,
        }
    }

    /// Delay before retry number `attempts` (1-based): the base window,
    /// doubled per further attempt, capped.
    pub fn backoff(&self, base: Duration, attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempts.saturating_sub(1));
        base.saturating_mul(factor).min(self.retry_backoff_max)
    }
}

impl From<&SyncConfig> for WritePolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            content_window: config.content_window(),
            geometry_window: config.geometry_window(),
            retry_backoff_max: config.retry_backoff_max(),
            failure_threshold: config.storage_failure_threshold.max(1),
        }
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// A write that did not reach the store. The record stays dirty and a
/// retry is scheduled.
#[derive(Debug)]
pub struct StorageFailure {
    pub record: RecordKey,
    /// Consecutive failures for this record, including this one.
    pub attempts: u32,
    /// `attempts` has reached the configured threshold.
    pub escalated: bool,
    pub error: StorageError,
}

#[derive(Debug, Default)]
pub struct FlushReport {
    pub written: usize,
    pub failures: Vec<StorageFailure>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: FlushReport) {
        self.written += other.written;
        self.failures.extend(other.failures);
    }
}

/// Outcome of loading both stores into the cache.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub tiles: usize,
    pub layouts: usize,
    /// Layouts that lost dangling or duplicate instances and will be rewritten.
    pub repaired: Vec<LayoutId>,
}

pub struct TileCache {
    tiles: BTreeMap<TileId, TileDefinition>,
    layouts: BTreeMap<LayoutId, Layout>,
    instance_index: HashMap<InstanceId, LayoutId>,
    dirty: HashSet<RecordKey>,
    failures: HashMap<RecordKey, u32>,
    scheduler: DebounceScheduler,
    stores: Stores,
    policy: WritePolicy,
    clock: Rc<dyn Clock>,
}

impl TileCache {
    pub fn new(stores: Stores, policy: WritePolicy, clock: Rc<dyn Clock>) -> Self {
        Self {
            tiles: BTreeMap::new(),
            layouts: BTreeMap::new(),
            instance_index: HashMap::new(),
            dirty: HashSet::new(),
            failures: HashMap::new(),
            scheduler: DebounceScheduler::new(),
            stores,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &WritePolicy {
        &self.policy
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tile(&self, id: &TileId) -> Option<&TileDefinition> {
        self.tiles.get(id)
    }

    pub fn contains_tile(&self, id: &TileId) -> bool {
        self.tiles.contains_key(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn layout(&self, id: &LayoutId) -> Option<&Layout> {
        self.layouts.get(id)
    }

    pub fn contains_layout(&self, id: &LayoutId) -> bool {
        self.layouts.contains_key(id)
    }

    pub fn layouts(&self) -> impl Iterator<Item = &Layout> {
        self.layouts.values()
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    /// The layout that owns `instance`.
    pub fn layout_of(&self, instance: &InstanceId) -> Option<&LayoutId> {
        self.instance_index.get(instance)
    }

    pub fn instance(&self, id: &InstanceId) -> Option<(&LayoutId, &TileInstance)> {
        let layout_id = self.instance_index.get(id)?;
        let instance = self.layouts.get(layout_id)?.instance(id)?;
        Some((layout_id, instance))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert or replace a tile. Marks it dirty.
    pub fn insert_tile(&mut self, tile: TileDefinition) -> Option<TileDefinition> {
        self.dirty.insert(RecordKey::Tile(tile.id.clone()));
        self.tiles.insert(tile.id.clone(), tile)
    }

    /// Mutate a tile in place. The closure reports whether anything changed;
    /// only then is the record marked dirty.
    pub fn update_tile_with<R>(
        &mut self,
        id: &TileId,
        f: impl FnOnce(&mut TileDefinition) -> (bool, R),
    ) -> Option<R> {
        let tile = self.tiles.get_mut(id)?;
        let (changed, out) = f(tile);
        if changed {
            self.dirty.insert(RecordKey::Tile(id.clone()));
        }
        Some(out)
    }

    /// Remove a tile, cancelling its pending timers. Its deletion is pending
    /// until the next flush of the record.
    pub fn remove_tile(&mut self, id: &TileId) -> Option<TileDefinition> {
        let removed = self.tiles.remove(id)?;
        let record = RecordKey::Tile(id.clone());
        self.scheduler.cancel_record(&record);
        self.dirty.insert(record);
        Some(removed)
    }

    /// Insert or replace a layout, indexing its instances. Marks it dirty.
    pub fn insert_layout(&mut self, layout: Layout) -> Option<Layout> {
        let id = layout.id.clone();
        let previous = self.layouts.insert(id.clone(), layout);
        self.reindex(&id, previous.as_ref());
        self.dirty.insert(RecordKey::Layout(id));
        previous
    }

    /// Mutate a layout in place. The instance index is rebuilt for it
    /// afterwards, so the closure may add or remove instances.
    pub fn update_layout_with<R>(
        &mut self,
        id: &LayoutId,
        f: impl FnOnce(&mut Layout) -> (bool, R),
    ) -> Option<R> {
        let layout = self.layouts.get_mut(id)?;
        let before = layout.clone();
        let (changed, out) = f(layout);
        if changed {
            self.reindex(id, Some(&before));
            self.dirty.insert(RecordKey::Layout(id.clone()));
        }
        Some(out)
    }

    pub fn remove_layout(&mut self, id: &LayoutId) -> Option<Layout> {
        let removed = self.layouts.remove(id)?;
        for instance in &removed.tile_instances {
            self.instance_index.remove(&instance.instance_id);
            self.scheduler
                .cancel(&DebounceKey::Instance(instance.instance_id.clone()));
        }
        let record = RecordKey::Layout(id.clone());
        self.scheduler.cancel_record(&record);
        self.dirty.insert(record);
        Some(removed)
    }

    /// Append an instance to a layout. Fails if the layout is missing or the
    /// instance id is already in use anywhere.
    pub fn add_instance(&mut self, layout_id: &LayoutId, instance: TileInstance) -> bool {
        if self.instance_index.contains_key(&instance.instance_id) {
            return false;
        }
        let Some(layout) = self.layouts.get_mut(layout_id) else {
            return false;
        };
        self.instance_index
            .insert(instance.instance_id.clone(), layout_id.clone());
        layout.tile_instances.push(instance);
        self.dirty.insert(RecordKey::Layout(layout_id.clone()));
        true
    }

    pub fn remove_instance(&mut self, id: &InstanceId) -> Option<(LayoutId, TileInstance)> {
        let layout_id = self.instance_index.get(id)?.clone();
        let removed = self.layouts.get_mut(&layout_id)?.remove_instance(id)?;
        self.instance_index.remove(id);
        self.scheduler.cancel(&DebounceKey::Instance(id.clone()));
        self.dirty.insert(RecordKey::Layout(layout_id.clone()));
        Some((layout_id, removed))
    }

    /// Mutate one instance in place; marks its layout dirty if changed.
    pub fn update_instance_with<R>(
        &mut self,
        id: &InstanceId,
        f: impl FnOnce(&mut TileInstance) -> (bool, R),
    ) -> Option<(LayoutId, R)> {
        let layout_id = self.instance_index.get(id)?.clone();
        let instance = self.layouts.get_mut(&layout_id)?.instance_mut(id)?;
        let (changed, out) = f(instance);
        if changed {
            self.dirty.insert(RecordKey::Layout(layout_id.clone()));
        }
        Some((layout_id, out))
    }

    /// Strip every instance of `tile` from every layout. Returns the
    /// affected layouts in id order.
    pub fn remove_instances_of(&mut self, tile: &TileId) -> Vec<LayoutId> {
        let mut affected = Vec::new();
        for (layout_id, layout) in self.layouts.iter_mut() {
            let removed = layout.remove_instances_of(tile);
            if removed.is_empty() {
                continue;
            }
            for instance_id in removed {
                self.instance_index.remove(&instance_id);
                self.scheduler.cancel(&DebounceKey::Instance(instance_id));
            }
            self.dirty.insert(RecordKey::Layout(layout_id.clone()));
            affected.push(layout_id.clone());
        }
        affected
    }

    /// (Re)start the debounce timer for `key` and mark its record dirty.
    ///
    /// Returns `false` if the key resolves to no cached record.
    pub fn schedule(&mut self, key: DebounceKey) -> bool {
        let Some(record) = self.record_for(&key) else {
            return false;
        };
        let window = self.policy.window(key.window());
        let deadline = self.clock.now() + window;
        self.dirty.insert(record.clone());
        self.scheduler.schedule(
            key,
            Timer {
                deadline,
                record,
                window,
            },
        );
        true
    }

    pub fn is_scheduled(&self, key: &DebounceKey) -> bool {
        self.scheduler.is_pending(key)
    }

    pub fn deadline(&self, key: &DebounceKey) -> Option<Instant> {
        self.scheduler.deadline(key)
    }

    pub fn is_dirty(&self, record: &RecordKey) -> bool {
        self.dirty.contains(record)
    }

    /// Records whose in-memory state has not reached the store.
    pub fn pending_writes(&self) -> usize {
        self.dirty.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    fn record_for(&self, key: &DebounceKey) -> Option<RecordKey> {
        match key {
            DebounceKey::Tile(id) => self.contains_tile(id).then(|| RecordKey::Tile(id.clone())),
            DebounceKey::Layout(id) => self
                .contains_layout(id)
                .then(|| RecordKey::Layout(id.clone())),
            DebounceKey::Instance(id) => self.layout_of(id).cloned().map(RecordKey::Layout),
        }
    }

    fn reindex(&mut self, id: &LayoutId, previous: Option<&Layout>) {
        if let Some(previous) = previous {
            for instance in &previous.tile_instances {
                if self.instance_index.get(&instance.instance_id) == Some(id) {
                    self.instance_index.remove(&instance.instance_id);
                }
            }
        }
        if let Some(layout) = self.layouts.get(id) {
            for instance in &layout.tile_instances {
                self.instance_index
                    .insert(instance.instance_id.clone(), id.clone());
            }
        }
    }
}

impl fmt::Debug for TileCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCache")
            .field("tiles", &self.tiles.len())
            .field("layouts", &self.layouts.len())
            .field("dirty", &self.dirty.len())
            .field("timers", &self.scheduler.len())
            .finish()
    }
}
