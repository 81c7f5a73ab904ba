//! Day-window math for history fetches.
//!
//! The fetch window is anchored to the requesting user's local calendar,
//! not a rolling 24-hour clock: "1 day back" means everything since local
//! midnight today.

use chrono::{DateTime, Duration, Utc};

/// Unix timestamp (seconds) of the start of the fetch window: local
/// midnight, `days_back - 1` days before `now` in the requester's timezone.
///
/// `days_back` of zero is treated as one day. `tz_offset_secs` is the
/// user's UTC offset in seconds, as reported by the Slack user profile.
pub fn window_start_ts(now: DateTime<Utc>, days_back: u32, tz_offset_secs: i32) -> i64 {
    let days_back = days_back.max(1);
    let local = now + Duration::seconds(i64::from(tz_offset_secs));
    let local_midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| local.naive_utc())
        .and_utc();
    let start_local = local_midnight - Duration::days(i64::from(days_back) - 1);
    start_local.timestamp() - i64::from(tz_offset_secs)
}
