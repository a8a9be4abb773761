//! Persisted and transient data model.

mod display;
mod layout;
mod tile;

pub use display::*;
pub use layout::*;
pub use tile::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// Opaque key/value configuration attached to tiles and layouts.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// A record the stores know how to persist under a stable id.
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Clone + Eq + Hash + Ord + fmt::Display + fmt::Debug + From<String>;

    /// Short lowercase label used for directory names and log lines.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

/// Shallow merge of `patch` into `target`. A `null` value removes the key.
///
/// Returns `true` if `target` changed.
pub fn merge_patch(target: &mut ConfigMap, patch: &ConfigMap) -> bool {
    let mut changed = false;
    for (key, value) in patch {
        if value.is_null() {
            changed |= target.remove(key).is_some();
        } else if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}
