//! Writing dirty records to the stores: debounced, forced, and retried.

use std::collections::HashSet;
use std::time::Duration;

use pinpoint_common::{InstanceId, StorageError};
use tracing::{debug, info, warn};

use super::scheduler::{DebounceKey, Timer};
use super::{FlushReport, LoadReport, RecordKey, StorageFailure, TileCache};

impl TileCache {
    /// Write `record` now, bypassing its debounce window.
    pub fn commit(&mut self, record: RecordKey) -> FlushReport {
        let mut report = FlushReport::default();
        let window = self.policy.content_window;
        self.flush_record(record, window, &mut report);
        report
    }

    /// Write every record whose timer has expired.
    pub fn poll(&mut self) -> FlushReport {
        let now = self.clock.now();
        let mut report = FlushReport::default();
        for fired in self.scheduler.take_due(now) {
            self.flush_record(fired.record, fired.window, &mut report);
        }
        report
    }

    /// Write every dirty record regardless of timers.
    pub fn flush_all(&mut self) -> FlushReport {
        let mut records: Vec<RecordKey> = self.dirty.iter().cloned().collect();
        records.sort();
        let window = self.policy.content_window;
        let mut report = FlushReport::default();
        for record in records {
            self.flush_record(record, window, &mut report);
        }
        if report.written > 0 || !report.is_clean() {
            info!(
                written = report.written,
                failed = report.failures.len(),
                "forced flush"
            );
        }
        report
    }

    fn flush_record(&mut self, record: RecordKey, window: Duration, report: &mut FlushReport) {
        self.scheduler.cancel_record(&record);
        if !self.dirty.contains(&record) {
            return;
        }

        match self.write(&record) {
            Ok(()) => {
                self.dirty.remove(&record);
                self.failures.remove(&record);
                report.written += 1;
                debug!(%record, "record written");
            }
            Err(error) => {
                let attempts = {
                    let count = self.failures.entry(record.clone()).or_insert(0);
                    *count += 1;
                    *count
                };
                let delay = self.policy.backoff(window, attempts);
                let deadline = self.clock.now() + delay;
                self.scheduler.schedule(
                    DebounceKey::from(&record),
                    Timer {
                        deadline,
                        record: record.clone(),
                        window,
                    },
                );
                warn!(
                    %record,
                    attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    "storage write failed: {error}"
                );
                report.failures.push(StorageFailure {
                    escalated: attempts >= self.policy.failure_threshold,
                    record,
                    attempts,
                    error,
                });
            }
        }
    }

    /// A record present in the cache is saved; an absent one is deleted.
    fn write(&self, record: &RecordKey) -> Result<(), StorageError> {
        match record {
            RecordKey::Tile(id) => match self.tiles.get(id) {
                Some(tile) => self.stores.tiles.save(tile),
                None => self.stores.tiles.delete(id),
            },
            RecordKey::Layout(id) => match self.layouts.get(id) {
                Some(layout) => self.stores.layouts.save(layout),
                None => self.stores.layouts.delete(id),
            },
        }
    }

    /// Replace the cache contents with what the stores hold.
    ///
    /// Instances that reference unknown tiles, and instance ids already used
    /// by an earlier layout, are dropped; their layouts are scheduled for
    /// rewrite.
    pub fn load(&mut self) -> Result<LoadReport, StorageError> {
        let tiles = self.stores.tiles.load_all()?;
        let layouts = self.stores.layouts.load_all()?;

        self.tiles.clear();
        self.layouts.clear();
        self.instance_index.clear();
        self.dirty.clear();
        self.failures.clear();
        self.scheduler.clear();

        for tile in tiles {
            if tile.id.is_blank() {
                warn!("skipping tile with blank id");
                continue;
            }
            self.tiles.insert(tile.id.clone(), tile);
        }

        let mut report = LoadReport {
            tiles: self.tiles.len(),
            ..LoadReport::default()
        };
        let mut seen: HashSet<InstanceId> = HashSet::new();

        for mut layout in layouts {
            if layout.id.is_blank() {
                warn!("skipping layout with blank id");
                continue;
            }
            let before = layout.tile_instances.len();
            let layout_id = layout.id.clone();
            let tiles = &self.tiles;
            layout.tile_instances.retain(|instance| {
                if !tiles.contains_key(&instance.tile_id) {
                    warn!(
                        layout = %layout_id,
                        instance = %instance.instance_id,
                        tile = %instance.tile_id,
                        "dropping instance of missing tile"
                    );
                    return false;
                }
                if !seen.insert(instance.instance_id.clone()) {
                    warn!(
                        layout = %layout_id,
                        instance = %instance.instance_id,
                        "dropping duplicate instance id"
                    );
                    return false;
                }
                true
            });
            let repaired = layout.tile_instances.len() != before;

            for instance in &layout.tile_instances {
                self.instance_index
                    .insert(instance.instance_id.clone(), layout_id.clone());
            }
            self.layouts.insert(layout_id.clone(), layout);

            if repaired {
                self.schedule(DebounceKey::Layout(layout_id.clone()));
                report.repaired.push(layout_id);
            }
        }

        report.layouts = self.layouts.len();
        info!(
            tiles = report.tiles,
            layouts = report.layouts,
            repaired = report.repaired.len(),
            "cache loaded"
        );
        Ok(report)
    }
}
