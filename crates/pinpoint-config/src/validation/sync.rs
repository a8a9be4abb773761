//! Debounce window and retry policy validation.

use crate::schema::PinpointConfig;

use super::helpers::validate_range;

pub(crate) fn validate_sync(errors: &mut Vec<String>, config: &PinpointConfig) {
    let sync = &config.sync;
    validate_range(
        errors,
        "sync.content_debounce_ms",
        sync.content_debounce_ms,
        10,
        10_000,
    );
    validate_range(
        errors,
        "sync.geometry_debounce_ms",
        sync.geometry_debounce_ms,
        10,
        10_000,
    );
    validate_range(
        errors,
        "sync.storage_failure_threshold",
        sync.storage_failure_threshold,
        1,
        100,
    );
    if sync.retry_backoff_max_ms < sync.content_debounce_ms {
        errors.push(format!(
            "sync.retry_backoff_max_ms = {} must be at least sync.content_debounce_ms ({})",
            sync.retry_backoff_max_ms, sync.content_debounce_ms
        ));
    }
}
