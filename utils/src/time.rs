//! Time formatting helpers.

use chrono::{DateTime, Utc};
use keyproof_types::Timestamp;

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Timestamps past chrono's range fall back to the raw `<secs>s` form.
pub fn format_time(ts: Timestamp) -> String {
    let datetime = i64::try_from(ts.as_secs())
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    match datetime {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ts.to_string(),
    }
}
