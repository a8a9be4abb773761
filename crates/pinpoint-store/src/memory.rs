//! In-memory store for tests and ephemeral sessions.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use pinpoint_common::{Record, StorageError};

use crate::store::RecordStore;

pub struct MemoryStore<R: Record> {
    records: RefCell<BTreeMap<R::Id, R>>,
    saves: Cell<usize>,
    deletes: Cell<usize>,
    failing_writes: Cell<u32>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: RefCell::new(BTreeMap::new()),
            saves: Cell::new(0),
            deletes: Cell::new(0),
            failing_writes: Cell::new(0),
        }
    }

    /// Pre-populate without counting as writes.
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let store = Self::new();
        store.records.borrow_mut().extend(
            records
                .into_iter()
                .map(|record| (record.id().clone(), record)),
        );
        store
    }

    /// Make the next `n` saves or deletes fail with `StorageError::Unavailable`.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.set(n);
    }

    pub fn get(&self, id: &R::Id) -> Option<R> {
        self.records.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &R::Id) -> bool {
        self.records.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Successful deletes so far.
    pub fn delete_count(&self) -> usize {
        self.deletes.get()
    }

    fn take_failure(&self) -> Result<(), StorageError> {
        let remaining = self.failing_writes.get();
        if remaining > 0 {
            self.failing_writes.set(remaining - 1);
            return Err(StorageError::Unavailable(format!(
                "{} store rejected write",
                R::KIND
            )));
        }
        Ok(())
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordStore<R> for MemoryStore<R> {
    fn load_all(&self) -> Result<Vec<R>, StorageError> {
        Ok(self.records.borrow().values().cloned().collect())
    }

    fn save(&self, record: &R) -> Result<(), StorageError> {
        self.take_failure()?;
        self.records
            .borrow_mut()
            .insert(record.id().clone(), record.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn delete(&self, id: &R::Id) -> Result<(), StorageError> {
        self.take_failure()?;
        self.records.borrow_mut().remove(id);
        self.deletes.set(self.deletes.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::{ConfigMap, TileDefinition, TileId};

    fn tile(id: &str) -> TileDefinition {
        TileDefinition::new(TileId::from(id), "note", ConfigMap::new())
    }

    #[test]
    fn save_and_get() {
        let store = MemoryStore::new();
        store.save(&tile("a")).unwrap();
        assert!(store.contains(&TileId::from("a")));
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn with_records_does_not_count_as_writes() {
        let store = MemoryStore::with_records([tile("a"), tile("b")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let store = MemoryStore::new();
        store.fail_next_writes(2);
        assert!(store.save(&tile("a")).is_err());
        assert!(store.delete(&TileId::from("a")).is_err());
        assert!(store.save(&tile("a")).is_ok());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn delete_missing_is_ok() {
        let store: MemoryStore<TileDefinition> = MemoryStore::new();
        store.delete(&TileId::from("ghost")).unwrap();
        assert!(store.is_empty());
    }
}
