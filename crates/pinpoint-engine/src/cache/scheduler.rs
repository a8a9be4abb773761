//! Per-key debounce deadlines.
//!
//! Scheduling a key that already has a deadline replaces it, so a burst of
//! edits to one record collapses into a single write once the burst stops.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use pinpoint_common::{InstanceId, LayoutId, TileId};

use super::RecordKey;

/// What a debounce timer is keyed by.
///
/// `Instance` timers write the layout that owns the instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DebounceKey {
    Tile(TileId),
    Layout(LayoutId),
    Instance(InstanceId),
}

impl DebounceKey {
    pub fn window(&self) -> Window {
        match self {
            DebounceKey::Tile(_) | DebounceKey::Layout(_) => Window::Content,
            DebounceKey::Instance(_) => Window::Geometry,
        }
    }
}

impl From<&RecordKey> for DebounceKey {
    fn from(record: &RecordKey) -> Self {
        match record {
            RecordKey::Tile(id) => DebounceKey::Tile(id.clone()),
            RecordKey::Layout(id) => DebounceKey::Layout(id.clone()),
        }
    }
}

impl fmt::Display for DebounceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceKey::Tile(id) => write!(f, "tile:{id}"),
            DebounceKey::Layout(id) => write!(f, "layout:{id}"),
            DebounceKey::Instance(id) => write!(f, "instance:{id}"),
        }
    }
}

/// Which configured debounce window applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Tile content and layout settings.
    Content,
    /// Instance position and size.
    Geometry,
}

#[derive(Debug, Clone)]
pub(crate) struct Timer {
    pub deadline: Instant,
    pub record: RecordKey,
    /// Base delay, reused as the first retry step if the write fails.
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub(crate) struct Fired {
    pub record: RecordKey,
    pub window: Duration,
}

#[derive(Debug, Default)]
pub(crate) struct DebounceScheduler {
    timers: HashMap<DebounceKey, Timer>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or reset the deadline for `key`.
    pub fn schedule(&mut self, key: DebounceKey, timer: Timer) {
        self.timers.insert(key, timer);
    }

    pub fn cancel(&mut self, key: &DebounceKey) -> bool {
        self.timers.remove(key).is_some()
    }

    /// Drop every timer that would write `record`.
    pub fn cancel_record(&mut self, record: &RecordKey) {
        self.timers.retain(|_, t| &t.record != record);
    }

    pub fn is_pending(&self, key: &DebounceKey) -> bool {
        self.timers.contains_key(key)
    }

    pub fn deadline(&self, key: &DebounceKey) -> Option<Instant> {
        self.timers.get(key).map(|t| t.deadline)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Remove and return every timer due at `now`, earliest first, one
    /// entry per record.
    pub fn take_due(&mut self, now: Instant) -> Vec<Fired> {
        let mut due: Vec<(DebounceKey, Timer)> = Vec::new();
        self.timers.retain(|key, timer| {
            if timer.deadline <= now {
                due.push((key.clone(), timer.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.deadline.cmp(&b.1.deadline).then_with(|| a.0.cmp(&b.0)));

        let mut fired: Vec<Fired> = Vec::with_capacity(due.len());
        for (_, timer) in due {
            if fired.iter().any(|f| f.record == timer.record) {
                continue;
            }
            fired.push(Fired {
                record: timer.record,
                window: timer.window,
            });
        }
        fired
    }
}
