//! Utility functions for statistics formatting and identifier handling

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Separator between the segments of a catalog identifier
pub const ID_SEPARATOR: char = '_';

/// Second segment of a `_`-separated identifier, or `""` if there is none
///
/// # Examples
///
/// ```
/// use taskfeed::utils::secondary_id;
///
/// assert_eq!(secondary_id("cat_42"), "42");
/// assert_eq!(secondary_id("cat_42_x"), "42");
/// assert_eq!(secondary_id("nodash"), "");
/// ```
#[must_use]
pub fn secondary_id(id: &str) -> &str {
    id.split(ID_SEPARATOR).nth(1).unwrap_or("")
}

/// Milliseconds between `start` and `end` (or `now` if `end` is unset)
///
/// Returns 0 when `start` is unset or when the clock went backwards.
#[must_use]
pub fn elapsed_millis(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u64 {
    let Some(start) = start else {
        return 0;
    };
    let end = end.unwrap_or(now);
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

/// Items per second, rounded to two decimals
///
/// Zero elapsed time yields `0.0` rather than infinity or NaN.
///
/// # Examples
///
/// ```
/// use taskfeed::utils::throughput;
///
/// assert_eq!(throughput(250, 1_000), 250.0);
/// assert_eq!(throughput(1, 3_000), 0.33);
/// assert_eq!(throughput(10, 0), 0.0);
/// ```
#[must_use]
pub fn throughput(count: u64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    let per_sec = (count as f64 / elapsed_ms as f64) * 1000.0;
    (per_sec * 100.0).round() / 100.0
}

/// Format milliseconds as zero-padded `HH:MM:SS.mmm`
///
/// The hours field grows past two digits instead of wrapping.
///
/// # Examples
///
/// ```
/// use taskfeed::utils::format_elapsed;
///
/// assert_eq!(format_elapsed(0), "00:00:00.000");
/// assert_eq!(format_elapsed(3_723_004), "01:02:03.004");
/// ```
#[must_use]
pub fn format_elapsed(millis: u64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1_000) % 60;
    let ms = millis % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{ms:03}")
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
