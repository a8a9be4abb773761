//! Synchronization timing and storage retry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Debounce windows and storage-failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Debounce window for tile content/config edits in ms (valid range: 10-10000).
    pub content_debounce_ms: u64,
    /// Debounce window for instance moves and resizes in ms (valid range: 10-10000).
    pub geometry_debounce_ms: u64,
    /// Upper bound for the storage retry backoff in ms (at least the content window).
    pub retry_backoff_max_ms: u64,
    /// Consecutive write failures before `error:storage` is raised (valid range: 1-100).
    pub storage_failure_threshold: u32,
}

impl SyncConfig {
    pub fn content_window(&self) -> Duration {
        Duration::from_millis(self.content_debounce_ms)
    }

    pub fn geometry_window(&self) -> Duration {
        Duration::from_millis(self.geometry_debounce_ms)
    }

    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            content_debounce_ms: 300,
            geometry_debounce_ms: 500,
            retry_backoff_max_ms: 30_000,
            storage_failure_threshold: 3,
        }
    }
}
