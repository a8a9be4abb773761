//! Loading, polling and flushing, with storage failures surfaced as events.

use pinpoint_common::{Event, StorageError};
use tracing::error;

use super::TileSynchronizer;
use crate::cache::{FlushReport, LoadReport, RecordKey};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushSummary {
    pub written: usize,
    pub failed: usize,
}

impl TileSynchronizer {
    /// Fill the cache from the stores. Call once before any mutation.
    pub fn load(&self) -> Result<LoadReport, StorageError> {
        self.cache.borrow_mut().load()
    }

    /// Write whatever is due. Drive this from the event loop.
    pub fn poll(&self) -> FlushSummary {
        let report = self.cache.borrow_mut().poll();
        self.report(report)
    }

    /// Write everything pending now, e.g. at shutdown.
    pub fn flush(&self) -> FlushSummary {
        let report = self.cache.borrow_mut().flush_all();
        self.report(report)
    }

    pub(super) fn commit(&self, records: impl IntoIterator<Item = RecordKey>) -> FlushSummary {
        let mut report = FlushReport::default();
        for record in records {
            let single = self.cache.borrow_mut().commit(record);
            report.merge(single);
        }
        self.report(report)
    }

    /// Failures that reached the threshold go out on `error:storage`.
    fn report(&self, report: FlushReport) -> FlushSummary {
        let summary = FlushSummary {
            written: report.written,
            failed: report.failures.len(),
        };
        for failure in report.failures {
            if !failure.escalated {
                continue;
            }
            error!(
                record = %failure.record,
                attempts = failure.attempts,
                "storage keeps failing: {}",
                failure.error
            );
            self.emit(Event::StorageFailed {
                kind: failure.record.kind(),
                record_id: failure.record.id(),
                attempts: failure.attempts,
                message: failure.error.to_string(),
            });
        }
        summary
    }
}
