//! Epoch-millisecond clock helpers.
//!
//! Hot-path timestamps are plain `i64` epoch milliseconds; every stateful
//! component takes "now" as an argument so tests never sleep. `chrono`
//! appears only at display and day-rollover boundaries.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as Unix epoch milliseconds.
#[inline]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Days since the Unix epoch for the given timestamp. Used to detect the
/// UTC daily rollover that resets per-day risk counters.
#[inline]
pub fn epoch_day(ts_ms: i64) -> i64 {
    ts_ms.div_euclid(86_400_000)
}

/// Display conversion for logs and reports.
pub fn to_datetime(ts_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
}
