//! One pretty-printed JSON file per record.
//!
//! Layout on disk: `<data_dir>/<kind>s/<id>.json`. Writes go to a
//! `.json.tmp` sibling first and are renamed into place.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use pinpoint_common::{Record, StorageError};
use tracing::{debug, info, warn};

use crate::store::RecordStore;

pub struct JsonDirStore<R> {
    dir: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JsonDirStore<R> {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(format!("{}s", R::KIND)),
            _record: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &R::Id) -> Result<PathBuf, StorageError> {
        let id = id.to_string();
        let unsafe_name = id.is_empty()
            || id.starts_with('.')
            || id.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(StorageError::Serialize {
                kind: R::KIND,
                id,
                message: "id is not usable as a file name".into(),
            });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn read_record(path: &Path) -> Result<R, StorageError> {
        let content = fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Copy every record file into a timestamped directory under `backup_root`.
    ///
    /// Returns the directory that was written.
    pub fn backup(&self, backup_root: &Path) -> Result<PathBuf, StorageError> {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let target = backup_root
            .join(format!("backup-{stamp}"))
            .join(format!("{}s", R::KIND));
        fs::create_dir_all(&target).map_err(|source| StorageError::Io {
            path: target.clone(),
            source,
        })?;

        let mut copied = 0usize;
        for path in self.record_files()? {
            let Some(name) = path.file_name() else {
                continue;
            };
            fs::copy(&path, target.join(name)).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            copied += 1;
        }
        info!(kind = R::KIND, copied, target = %target.display(), "backup written");
        Ok(target)
    }

    fn record_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }
}

impl<R: Record> RecordStore<R> for JsonDirStore<R> {
    fn load_all(&self) -> Result<Vec<R>, StorageError> {
        let mut records = Vec::new();
        for path in self.record_files()? {
            match Self::read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(kind = R::KIND, "skipping unreadable record: {e}"),
            }
        }
        debug!(kind = R::KIND, count = records.len(), dir = %self.dir.display(), "records loaded");
        Ok(records)
    }

    fn save(&self, record: &R) -> Result<(), StorageError> {
        let path = self.path_for(record.id())?;
        let json = serde_json::to_string_pretty(record).map_err(|e| StorageError::Serialize {
            kind: R::KIND,
            id: record.id().to_string(),
            message: e.to_string(),
        })?;

        self.ensure_dir()?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        if let Err(e) = fs::rename(&tmp_path, &path) {
            warn!("atomic rename failed ({e}), falling back to direct write");
            fs::write(&path, &json).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            let _ = fs::remove_file(&tmp_path);
        }

        debug!(kind = R::KIND, id = %record.id(), "record saved");
        Ok(())
    }

    fn delete(&self, id: &R::Id) -> Result<(), StorageError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(kind = R::KIND, %id, "record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::{Layout, LayoutId, TileDefinition, TileId, TileInstance};
    use serde_json::json;
    use tempfile::TempDir;

    fn note(id: &str, content: &str) -> TileDefinition {
        let config = json!({ "content": content }).as_object().cloned().unwrap();
        TileDefinition::new(TileId::from(id), "note", config)
    }

    #[test]
    fn load_from_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(&dir.path().join("nope"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_config_and_type() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.save(&note("note-1", "Hello")).unwrap();

        assert!(dir.path().join("tiles").join("note-1.json").exists());
        assert!(!dir.path().join("tiles").join("note-1.json.tmp").exists());

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].tile_type, "note");
        assert_eq!(loaded[0].config["content"], "Hello");
    }

    #[test]
    fn save_overwrites_existing_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.save(&note("note-1", "Hello")).unwrap();
        store.save(&note("note-1", "Hi")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].config["content"], "Hi");
    }

    #[test]
    fn delete_missing_record_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.delete(&TileId::from("ghost")).unwrap();
    }

    #[test]
    fn delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.save(&note("note-1", "Hello")).unwrap();
        store.delete(&TileId::from("note-1")).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.save(&note("good", "ok")).unwrap();
        fs::write(store.dir().join("bad.json"), "{ not json").unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, TileId::from("good"));
    }

    #[test]
    fn path_traversal_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        let err = store.save(&note("../escape", "x")).unwrap_err();
        assert!(matches!(err, StorageError::Serialize { .. }));
    }

    #[test]
    fn layouts_live_in_their_own_dir() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<Layout>::new(dir.path());
        let mut layout = Layout::new(LayoutId::from("layout-1"), "Desk", 0);
        layout
            .tile_instances
            .push(TileInstance::new(TileId::from("note-1"), Default::default(), Default::default()));
        store.save(&layout).unwrap();

        assert!(dir.path().join("layouts").join("layout-1.json").exists());
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded[0].name, "Desk");
        assert_eq!(loaded[0].tile_instances.len(), 1);
    }

    #[test]
    fn backup_copies_every_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonDirStore::<TileDefinition>::new(dir.path());
        store.save(&note("a", "1")).unwrap();
        store.save(&note("b", "2")).unwrap();

        let backup_root = dir.path().join("backups");
        let target = store.backup(&backup_root).unwrap();
        assert!(target.starts_with(&backup_root));
        assert!(target.join("a.json").exists());
        assert!(target.join("b.json").exists());
    }
}
