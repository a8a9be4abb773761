use std::path::Path;
use std::rc::Rc;

use pinpoint_common::{Layout, Record, StorageError, TileDefinition};

use crate::json_dir::JsonDirStore;
use crate::memory::MemoryStore;

/// Durable storage for one kind of record.
pub trait RecordStore<R: Record> {
    /// Every readable record. Unreadable entries are skipped, not fatal.
    fn load_all(&self) -> Result<Vec<R>, StorageError>;

    /// Insert or replace the record with the same id.
    fn save(&self, record: &R) -> Result<(), StorageError>;

    /// Remove a record. Removing an id that is not stored succeeds.
    fn delete(&self, id: &R::Id) -> Result<(), StorageError>;
}

/// The pair of stores the engine persists through.
#[derive(Clone)]
pub struct Stores {
    pub tiles: Rc<dyn RecordStore<TileDefinition>>,
    pub layouts: Rc<dyn RecordStore<Layout>>,
}

impl Stores {
    pub fn new(
        tiles: Rc<dyn RecordStore<TileDefinition>>,
        layouts: Rc<dyn RecordStore<Layout>>,
    ) -> Self {
        Self { tiles, layouts }
    }

    /// JSON files under `data_dir/tiles` and `data_dir/layouts`.
    pub fn json_dir(data_dir: &Path) -> Self {
        Self {
            tiles: Rc::new(JsonDirStore::<TileDefinition>::new(data_dir)),
            layouts: Rc::new(JsonDirStore::<Layout>::new(data_dir)),
        }
    }

    /// Fresh in-memory stores, returned alongside the concrete handles
    /// so callers can inspect writes or inject failures.
    pub fn memory() -> (Self, Rc<MemoryStore<TileDefinition>>, Rc<MemoryStore<Layout>>) {
        let tiles = Rc::new(MemoryStore::new());
        let layouts = Rc::new(MemoryStore::new());
        (
            Self {
                tiles: tiles.clone(),
                layouts: layouts.clone(),
            },
            tiles,
            layouts,
        )
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
