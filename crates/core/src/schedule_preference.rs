//! Weekly schedule preferences: "every Monday at 09:00".
//!
//! Preferences are stored as JSON text on package purchases. Parsing is
//! lenient (bad entries are dropped) so a corrupted row never breaks a page;
//! [`try_parse_schedule_preferences`] exposes what was dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::business_hours::BusinessHoursConfig;
use crate::json_list::{parse_json_list, JsonListError, ParsedList};
use crate::time_of_day::is_valid_time_format;
use crate::types::DayOfWeek;

/// A recurring weekly slot request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchedulePreference {
    /// 0 = Sunday .. 6 = Saturday.
    #[serde(rename = "dayOfWeek", alias = "day_of_week")]
    pub day_of_week: DayOfWeek,
    /// Venue-local `HH:MM`.
    pub time: String,
}

impl SchedulePreference {
    pub fn new(day_of_week: DayOfWeek, time: impl Into<String>) -> Self {
        Self {
            day_of_week,
            time: time.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn accept_preference(value: &Value) -> Option<SchedulePreference> {
    let obj = value.as_object()?;
    let day = obj
        .get("dayOfWeek")
        .or_else(|| obj.get("day_of_week"))?
        .as_u64()
        .filter(|d| *d <= 6)?;
    let time = obj.get("time")?.as_str().filter(|t| is_valid_time_format(t))?;
    Some(SchedulePreference::new(day as DayOfWeek, time))
}

/// Parse stored preferences, reporting malformed input instead of hiding it.
pub fn try_parse_schedule_preferences(
    json: &str,
) -> Result<ParsedList<SchedulePreference>, JsonListError> {
    parse_json_list(json, accept_preference)
}

/// Parse stored preferences. Never fails: malformed entries are dropped and
/// unreadable input yields an empty list.
pub fn parse_schedule_preferences(json: &str) -> Vec<SchedulePreference> {
    try_parse_schedule_preferences(json)
        .map(|parsed| parsed.items)
        .unwrap_or_default()
}

/// Serialize preferences for storage.
pub fn stringify_schedule_preferences(preferences: &[SchedulePreference]) -> String {
    serde_json::to_string(preferences).unwrap_or_else(|_| "[]".to_string())
}

// ---------------------------------------------------------------------------
// Validation & ordering
// ---------------------------------------------------------------------------

/// Whether a preference can actually be booked: Monday to Saturday, a
/// well-formed time, and inside `hours`.
pub fn is_valid_preference(preference: &SchedulePreference, hours: &BusinessHoursConfig) -> bool {
    (1..=6).contains(&preference.day_of_week)
        && is_valid_time_format(&preference.time)
        && hours.is_within(preference.day_of_week, &preference.time)
}

/// Sort key placing Monday first and Sunday last (1, 2, .., 6, 0).
pub fn week_order(day: DayOfWeek) -> u8 {
    if day == 0 {
        7
    } else {
        day
    }
}

/// Stable sort of `(original_index, preference)` pairs by [`week_order`].
pub fn sort_preferences(preferences: &[SchedulePreference]) -> Vec<(usize, &SchedulePreference)> {
    let mut indexed: Vec<_> = preferences.iter().enumerate().collect();
    indexed.sort_by_key(|(_, p)| week_order(p.day_of_week));
    indexed
}
