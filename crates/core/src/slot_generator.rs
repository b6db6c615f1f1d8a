//! Bulk appointment-slot generation from weekly preferences.
//!
//! Walks the calendar one day at a time from a start date and turns each
//! matching weekly preference into a concrete slot, honouring business hours
//! and an exclusion list. Availability against existing appointments is not
//! checked here; an optional [`ConflictCheck`] can annotate slots instead.

use std::collections::HashSet;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::business_hours::{default_business_hours, BusinessHoursConfig};
use crate::conflict::ConflictCheck;
use crate::error::CoreError;
use crate::schedule_preference::{sort_preferences, SchedulePreference};
use crate::time_of_day::{calculate_end_time, is_valid_time_format};
use crate::types::DayOfWeek;

/// Generation never looks further ahead than this from the start date.
pub const HORIZON_MONTHS: u32 = 12;

/// Upper bound on slots a single request may ask for.
pub const MAX_BULK_SLOTS: u32 = 200;

/// Most days a walk can visit: a leap year plus the start day.
const HORIZON_DAYS: usize = 367;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input of a bulk generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkScheduleRequest {
    pub start_date: NaiveDate,
    pub preferences: Vec<SchedulePreference>,
    /// Number of slots wanted.
    pub count: u32,
    /// Session length in minutes.
    pub package_duration: u32,
    #[serde(default)]
    pub exclude_dates: Vec<NaiveDate>,
}

impl BulkScheduleRequest {
    /// Reject requests no caller should be able to make.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.package_duration == 0 {
            return Err(CoreError::Validation(
                "package_duration must be greater than zero".to_string(),
            ));
        }
        if self.count > MAX_BULK_SLOTS {
            return Err(CoreError::Validation(format!(
                "count must not exceed {MAX_BULK_SLOTS}"
            )));
        }
        if let Some(bad) = self
            .preferences
            .iter()
            .find(|p| !is_valid_time_format(&p.time))
        {
            return Err(CoreError::Validation(format!(
                "Invalid preference time '{}', expected HH:MM",
                bad.time
            )));
        }
        Ok(())
    }
}

/// A proposed appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub day_of_week: DayOfWeek,
    /// Index of the originating preference in the caller's input.
    pub preference_index: usize,
    pub has_conflict: bool,
    pub conflict_count: u32,
}

/// Calendar extent of a generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSpan {
    pub weeks: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Slot generator bound to a business-hours table and, optionally, a
/// conflict predicate.
pub struct SlotGenerator<'a> {
    hours: &'a BusinessHoursConfig,
    conflict_check: Option<&'a dyn ConflictCheck>,
}

impl<'a> SlotGenerator<'a> {
    pub fn new(hours: &'a BusinessHoursConfig) -> Self {
        Self {
            hours,
            conflict_check: None,
        }
    }

    /// Annotate every emitted slot with `check`.
    pub fn with_conflict_check(mut self, check: &'a dyn ConflictCheck) -> Self {
        self.conflict_check = Some(check);
        self
    }

    /// Produce up to `request.count` slots in chronological order.
    ///
    /// At most one slot per calendar day: the first preference (after
    /// Monday-first sorting) matching the weekday wins. A short result means
    /// the one-year horizon ran out.
    pub fn generate(&self, request: &BulkScheduleRequest) -> Vec<GeneratedSlot> {
        let wanted = request.count as usize;
        if request.preferences.is_empty() || wanted == 0 {
            return Vec::new();
        }

        let sorted = sort_preferences(&request.preferences);
        let excluded: HashSet<NaiveDate> = request.exclude_dates.iter().copied().collect();
        let horizon = request
            .start_date
            .checked_add_months(Months::new(HORIZON_MONTHS))
            .unwrap_or(NaiveDate::MAX);

        let mut slots = Vec::with_capacity(wanted.min(HORIZON_DAYS));
        let mut current = request.start_date;

        while slots.len() < wanted && current <= horizon {
            let day = current.weekday().num_days_from_sunday() as DayOfWeek;

            if let Some(&(index, preference)) =
                sorted.iter().find(|(_, p)| p.day_of_week == day)
            {
                let slot = self.slot_for(current, day, index, preference, request, &excluded);
                slots.extend(slot);
            }

            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        slots
    }

    fn slot_for(
        &self,
        date: NaiveDate,
        day: DayOfWeek,
        preference_index: usize,
        preference: &SchedulePreference,
        request: &BulkScheduleRequest,
        excluded: &HashSet<NaiveDate>,
    ) -> Option<GeneratedSlot> {
        if !self.hours.is_within(day, &preference.time) || excluded.contains(&date) {
            return None;
        }
        let end_time = calculate_end_time(&preference.time, request.package_duration).ok()?;

        let mut slot = GeneratedSlot {
            date,
            start_time: preference.time.clone(),
            end_time,
            day_of_week: day,
            preference_index,
            has_conflict: false,
            conflict_count: 0,
        };
        if let Some(check) = self.conflict_check {
            slot.conflict_count = check.conflict_count(&slot);
            slot.has_conflict = slot.conflict_count > 0;
        }
        Some(slot)
    }
}

/// Generate against the venue default business hours without conflict checks.
pub fn generate_bulk_schedule(request: &BulkScheduleRequest) -> Vec<GeneratedSlot> {
    SlotGenerator::new(default_business_hours()).generate(request)
}

/// Weeks spanned by a chronologically sorted slot list (ceiling of the day
/// difference over seven).
pub fn calculate_schedule_span(slots: &[GeneratedSlot]) -> ScheduleSpan {
    let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
        return ScheduleSpan {
            weeks: 0,
            start_date: None,
            end_date: None,
        };
    };

    let days = last.date.signed_duration_since(first.date).num_days().max(0) as u32;
    ScheduleSpan {
        weeks: days.div_ceil(7),
        start_date: Some(first.date),
        end_date: Some(last.date),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::business_hours::DayHours;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(preferences: Vec<SchedulePreference>, count: u32) -> BulkScheduleRequest {
        BulkScheduleRequest {
            // Monday.
            start_date: date(2024, 1, 1),
            preferences,
            count,
            package_duration: 60,
            exclude_dates: vec![],
        }
    }

    // -----------------------------------------------------------------------
    // Basic generation
    // -----------------------------------------------------------------------

    #[test]
    fn weekly_monday_slots() {
        let slots = generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "09:00")], 3));

        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
        for slot in &slots {
            assert_eq!(slot.start_time, "09:00");
            assert_eq!(slot.end_time, "10:00");
            assert_eq!(slot.day_of_week, 1);
            assert!(!slot.has_conflict);
            assert_eq!(slot.conflict_count, 0);
        }
    }

    #[test]
    fn empty_preferences_or_zero_count_yield_nothing() {
        assert!(generate_bulk_schedule(&request(vec![], 5)).is_empty());
        assert!(generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "09:00")], 0)).is_empty());
    }

    #[test]
    fn two_preferences_interleave_chronologically() {
        let prefs = vec![
            SchedulePreference::new(4, "15:00"),
            SchedulePreference::new(2, "10:00"),
        ];
        let slots = generate_bulk_schedule(&request(prefs, 4));

        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].date, date(2024, 1, 2));
        assert_eq!(slots[0].preference_index, 1);
        assert_eq!(slots[1].date, date(2024, 1, 4));
        assert_eq!(slots[1].preference_index, 0);
        assert!(slots.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn first_matching_preference_wins_per_day() {
        let prefs = vec![
            SchedulePreference::new(1, "11:00"),
            SchedulePreference::new(1, "09:00"),
        ];
        let slots = generate_bulk_schedule(&request(prefs, 2));
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.start_time == "11:00"));
        assert_eq!(slots[1].date, date(2024, 1, 8));
    }

    // -----------------------------------------------------------------------
    // Legality
    // -----------------------------------------------------------------------

    #[test]
    fn sunday_preferences_never_produce_slots() {
        let prefs = vec![
            SchedulePreference::new(0, "10:00"),
            SchedulePreference::new(5, "10:00"),
        ];
        let slots = generate_bulk_schedule(&request(prefs, 10));
        assert_eq!(slots.len(), 10);
        assert!(slots.iter().all(|s| s.day_of_week != 0));
    }

    #[test]
    fn unschedulable_preferences_return_short_after_a_year() {
        let prefs = vec![
            SchedulePreference::new(0, "10:00"),
            SchedulePreference::new(2, "13:00"),
        ];
        assert!(generate_bulk_schedule(&request(prefs, 5)).is_empty());
    }

    #[test]
    fn horizon_caps_the_result() {
        let slots = generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "09:00")], 200));
        // 2024-01-01 .. 2025-01-01 inclusive holds 53 Mondays.
        assert_eq!(slots.len(), 53);
        assert_eq!(slots.last().unwrap().date, date(2024, 12, 30));
    }

    #[test]
    fn huge_count_stops_at_the_horizon() {
        let slots =
            generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "09:00")], u32::MAX));
        assert_eq!(slots.len(), 53);
    }

    #[test]
    fn excluded_dates_are_skipped() {
        let mut req = request(vec![SchedulePreference::new(1, "09:00")], 3);
        req.exclude_dates = vec![date(2024, 1, 8)];
        let slots = generate_bulk_schedule(&req);

        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 22)]);
    }

    #[test]
    fn session_past_midnight_is_not_emitted() {
        let mut hours = BusinessHoursConfig::venue_default();
        hours.days[1] = Some(DayHours {
            start: "20:00".to_string(),
            end: "23:59".to_string(),
            breaks: vec![],
        });
        let req = request(vec![SchedulePreference::new(1, "23:30")], 2);
        assert!(SlotGenerator::new(&hours).generate(&req).is_empty());
    }

    #[test]
    fn unpadded_preference_time_produces_no_slots() {
        let slots = generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "9:00")], 3));
        assert!(slots.is_empty());
    }

    #[test]
    fn injected_hours_are_respected() {
        let mut hours = BusinessHoursConfig::venue_default();
        hours.days[1] = None;
        let req = request(vec![SchedulePreference::new(1, "09:00")], 2);
        assert!(SlotGenerator::new(&hours).generate(&req).is_empty());
    }

    // -----------------------------------------------------------------------
    // Conflict annotation
    // -----------------------------------------------------------------------

    #[test]
    fn conflict_check_annotates_slots() {
        let busy = date(2024, 1, 8);
        let check = move |slot: &GeneratedSlot| -> u32 { if slot.date == busy { 2 } else { 0 } };
        let hours = BusinessHoursConfig::venue_default();
        let slots = SlotGenerator::new(&hours)
            .with_conflict_check(&check)
            .generate(&request(vec![SchedulePreference::new(1, "09:00")], 3));

        assert!(!slots[0].has_conflict);
        assert!(slots[1].has_conflict);
        assert_eq!(slots[1].conflict_count, 2);
        assert!(!slots[2].has_conflict);
    }

    // -----------------------------------------------------------------------
    // Request validation & span
    // -----------------------------------------------------------------------

    #[test]
    fn zero_duration_is_rejected() {
        let mut req = request(vec![SchedulePreference::new(1, "09:00")], 3);
        req.package_duration = 0;
        assert_matches!(req.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn malformed_preference_time_is_rejected() {
        let req = request(vec![SchedulePreference::new(1, "+9:00")], 3);
        assert_matches!(req.validate(), Err(CoreError::Validation(msg)) if msg.contains("+9:00"));
    }

    #[test]
    fn oversized_count_is_rejected() {
        let req = request(vec![SchedulePreference::new(1, "09:00")], MAX_BULK_SLOTS + 1);
        assert_matches!(req.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn span_of_weekly_slots() {
        let slots = generate_bulk_schedule(&request(vec![SchedulePreference::new(1, "09:00")], 3));
        let span = calculate_schedule_span(&slots);
        assert_eq!(span.weeks, 2);
        assert_eq!(span.start_date, Some(date(2024, 1, 1)));
        assert_eq!(span.end_date, Some(date(2024, 1, 15)));
    }

    #[test]
    fn span_rounds_partial_weeks_up() {
        let prefs = vec![
            SchedulePreference::new(1, "09:00"),
            SchedulePreference::new(3, "09:00"),
        ];
        let slots = generate_bulk_schedule(&request(prefs, 3));
        // Mon 1st, Wed 3rd, Mon 8th: 7 days.
        assert_eq!(slots.last().unwrap().date, date(2024, 1, 8));
        assert_eq!(calculate_schedule_span(&slots).weeks, 1);

        let slots = generate_bulk_schedule(&request(
            vec![SchedulePreference::new(1, "09:00"), SchedulePreference::new(3, "09:00")],
            4,
        ));
        // Ends Wed 10th: 9 days -> 2 weeks.
        assert_eq!(calculate_schedule_span(&slots).weeks, 2);
    }

    #[test]
    fn span_of_nothing() {
        let span = calculate_schedule_span(&[]);
        assert_eq!(span.weeks, 0);
        assert!(span.start_date.is_none());
        assert!(span.end_date.is_none());
    }
}
