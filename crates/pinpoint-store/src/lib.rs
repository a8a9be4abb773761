//! Persistence for tiles and layouts.
//!
//! Stores are synchronous and keyed by record id. The engine only ever
//! talks to them through [`RecordStore`], so tests swap in
//! [`MemoryStore`] while the app uses [`JsonDirStore`].

mod json_dir;
mod memory;
mod store;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use store::{RecordStore, Stores};
