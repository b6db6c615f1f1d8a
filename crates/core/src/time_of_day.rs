//! Wall-clock time helpers for `"HH:MM"` strings.
//!
//! All arithmetic is done in minutes since midnight. No timezone handling
//! happens here: callers pass venue-local wall-clock times.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Zero-padded 24-hour `HH:MM`.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid regex"));

/// Whether `time` is a zero-padded 24-hour `HH:MM` string.
pub fn is_valid_time_format(time: &str) -> bool {
    TIME_RE.is_match(time)
}

/// Parse `HH:MM` into minutes since midnight.
///
/// Returns `None` for anything that is not a zero-padded time of day.
pub fn time_to_minutes(time: &str) -> Option<u32> {
    if !is_valid_time_format(time) {
        return None;
    }
    let (hours, minutes) = time.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// Render minutes since midnight as `HH:MM`, wrapping modulo one day.
pub fn minutes_to_time(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Add a session duration to a start time.
///
/// Sessions may not cross midnight: an end at or past `24:00` is rejected
/// instead of wrapping around to the early morning.
pub fn calculate_end_time(start: &str, duration_minutes: u32) -> Result<String, CoreError> {
    let start_minutes = time_to_minutes(start)
        .ok_or_else(|| CoreError::Validation(format!("Invalid start time '{start}'")))?;
    let end_minutes = start_minutes.saturating_add(duration_minutes);
    if end_minutes >= MINUTES_PER_DAY {
        return Err(CoreError::Validation(format!(
            "A {duration_minutes}-minute session starting at {start} would end after midnight"
        )));
    }
    Ok(minutes_to_time(end_minutes))
}
