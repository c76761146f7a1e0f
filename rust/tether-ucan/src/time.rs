//! Time utilities.

pub mod range;

pub use range::TimeRange;

use web_time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds.
#[must_use]
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
