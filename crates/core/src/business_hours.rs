//! Venue business hours: the per-weekday open/close/break table that decides
//! whether a session may start at a given wall-clock time.
//!
//! The table is a plain value so callers can inject an alternate schedule
//! (tests, another location). [`default_business_hours`] returns the venue's
//! compiled-in table.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::time_of_day::{is_valid_time_format, minutes_to_time, time_to_minutes};
use crate::types::DayOfWeek;

/// Step between consecutive bookable start times.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// Sunday. The venue never opens on this day.
pub const SUNDAY: DayOfWeek = 0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A closed interval inside an open day, e.g. the lunch break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: String,
    pub end: String,
}

/// Opening hours of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub breaks: Vec<BreakWindow>,
}

impl DayHours {
    fn new(start: &str, end: &str, breaks: &[(&str, &str)]) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            breaks: breaks
                .iter()
                .map(|(s, e)| BreakWindow {
                    start: s.to_string(),
                    end: e.to_string(),
                })
                .collect(),
        }
    }

    /// Whether a session may start at `minutes` on this day.
    ///
    /// Open interval is `[start, end)`; a break `[break_start, break_end)`
    /// blocks its start but not its end.
    fn allows(&self, minutes: u32) -> bool {
        let (Some(start), Some(end)) = (time_to_minutes(&self.start), time_to_minutes(&self.end))
        else {
            return false;
        };
        if minutes < start || minutes >= end {
            return false;
        }
        !self.breaks.iter().any(|b| {
            match (time_to_minutes(&b.start), time_to_minutes(&b.end)) {
                (Some(bs), Some(be)) => minutes >= bs && minutes < be,
                _ => false,
            }
        })
    }
}

/// Opening hours for every day of the week, indexed 0 (Sunday) to 6
/// (Saturday). `None` marks a closed day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursConfig {
    pub days: [Option<DayHours>; 7],
}

static DEFAULT_BUSINESS_HOURS: LazyLock<BusinessHoursConfig> =
    LazyLock::new(BusinessHoursConfig::venue_default);

/// The venue's compiled-in business hours.
pub fn default_business_hours() -> &'static BusinessHoursConfig {
    &DEFAULT_BUSINESS_HOURS
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self::venue_default()
    }
}

impl BusinessHoursConfig {
    /// Monday runs straight through; Tuesday to Saturday close for lunch.
    pub fn venue_default() -> Self {
        let lunch = [("12:00", "14:30")];
        Self {
            days: [
                None,
                Some(DayHours::new("09:00", "18:00", &[])),
                Some(DayHours::new("09:00", "18:00", &lunch)),
                Some(DayHours::new("09:00", "18:00", &lunch)),
                Some(DayHours::new("09:00", "18:00", &lunch)),
                Some(DayHours::new("09:00", "18:00", &lunch)),
                Some(DayHours::new("09:00", "17:00", &lunch)),
            ],
        }
    }

    /// Parse and validate a table from JSON (e.g. an environment override).
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid business hours JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants: Sunday closed, well-formed times,
    /// `start < end`, and breaks contained in their day.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.days[SUNDAY as usize].is_some() {
            return Err(CoreError::Validation(
                "Business hours must keep Sunday closed".to_string(),
            ));
        }

        for (day, hours) in self.days.iter().enumerate() {
            let Some(hours) = hours else { continue };
            let (start, end) = parse_interval(&hours.start, &hours.end)
                .ok_or_else(|| invalid_interval(day, &hours.start, &hours.end))?;
            for b in &hours.breaks {
                let (bs, be) = parse_interval(&b.start, &b.end)
                    .ok_or_else(|| invalid_interval(day, &b.start, &b.end))?;
                if bs < start || be > end {
                    return Err(CoreError::Validation(format!(
                        "Break {}-{} on day {day} falls outside opening hours",
                        b.start, b.end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Hours for `day`, or `None` when closed or out of range.
    pub fn day(&self, day: DayOfWeek) -> Option<&DayHours> {
        self.days.get(usize::from(day))?.as_ref()
    }

    /// Whether a session may start at `time` on `day`.
    pub fn is_within(&self, day: DayOfWeek, time: &str) -> bool {
        match (self.day(day), time_to_minutes(time)) {
            (Some(hours), Some(minutes)) => hours.allows(minutes),
            _ => false,
        }
    }

    /// Every legal start time for `day` in [`SLOT_STEP_MINUTES`] steps.
    pub fn available_times(&self, day: DayOfWeek) -> Vec<String> {
        let Some(hours) = self.day(day) else {
            return Vec::new();
        };
        let (Some(start), Some(end)) = (time_to_minutes(&hours.start), time_to_minutes(&hours.end))
        else {
            return Vec::new();
        };

        (start..end)
            .step_by(SLOT_STEP_MINUTES as usize)
            .map(minutes_to_time)
            .filter(|t| self.is_within(day, t))
            .collect()
    }
}

fn parse_interval(start: &str, end: &str) -> Option<(u32, u32)> {
    if !is_valid_time_format(start) || !is_valid_time_format(end) {
        return None;
    }
    let (s, e) = (time_to_minutes(start)?, time_to_minutes(end)?);
    (s < e).then_some((s, e))
}

fn invalid_interval(day: usize, start: &str, end: &str) -> CoreError {
    CoreError::Validation(format!("Invalid interval {start}-{end} on day {day}"))
}

// ---------------------------------------------------------------------------
// Default-table shortcuts
// ---------------------------------------------------------------------------

/// [`BusinessHoursConfig::is_within`] against the venue default table.
pub fn is_within_business_hours(day: DayOfWeek, time: &str) -> bool {
    default_business_hours().is_within(day, time)
}

/// [`BusinessHoursConfig::available_times`] against the venue default table.
pub fn get_available_times_for_day(day: DayOfWeek) -> Vec<String> {
    default_business_hours().available_times(day)
}
