//! Handlers for scheduling: business hours, preference validation and bulk
//! slot previews.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use babyspa_core::conflict::PopularTimes;
use babyspa_core::locale::{format_preferences_text, get_day_name};
use babyspa_core::schedule_preference::{is_valid_preference, SchedulePreference};
use babyspa_core::slot_generator::{
    calculate_schedule_span, BulkScheduleRequest, GeneratedSlot, ScheduleSpan, SlotGenerator,
};
use babyspa_core::types::DayOfWeek;
use babyspa_db::repositories::AppointmentRepo;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::query::LocaleParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /schedules/business-hours
// ---------------------------------------------------------------------------

/// Return the business-hours table this server validates against.
pub async fn business_hours(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.config.business_hours.clone(),
    }))
}

// ---------------------------------------------------------------------------
// GET /schedules/available-times/{day_of_week}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AvailableTimes {
    pub day_of_week: DayOfWeek,
    pub day_name: &'static str,
    pub times: Vec<String>,
}

/// List every bookable start time for a weekday (`0` = Sunday).
pub async fn available_times(
    State(state): State<AppState>,
    Path(day_of_week): Path<DayOfWeek>,
    Query(params): Query<LocaleParams>,
) -> AppResult<impl IntoResponse> {
    let day_name = get_day_name(day_of_week, params.locale).ok_or_else(|| {
        AppError::BadRequest(format!("day_of_week must be 0-6, got {day_of_week}"))
    })?;

    Ok(Json(DataResponse {
        data: AvailableTimes {
            day_of_week,
            day_name,
            times: state.config.business_hours.available_times(day_of_week),
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /schedules/preferences/validate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ValidatePreferencesRequest {
    pub preferences: Vec<SchedulePreference>,
}

#[derive(Debug, Serialize)]
pub struct PreferenceCheck {
    pub index: usize,
    pub preference: SchedulePreference,
    pub day_name: Option<&'static str>,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct PreferenceValidation {
    pub all_valid: bool,
    pub results: Vec<PreferenceCheck>,
    /// Localized summary of the valid preferences, Monday first.
    pub summary: String,
}

/// Check each preference against business hours and render a summary line.
pub async fn validate_preferences(
    State(state): State<AppState>,
    Query(params): Query<LocaleParams>,
    Json(body): Json<ValidatePreferencesRequest>,
) -> AppResult<impl IntoResponse> {
    let hours = &state.config.business_hours;

    let results: Vec<PreferenceCheck> = body
        .preferences
        .into_iter()
        .enumerate()
        .map(|(index, preference)| PreferenceCheck {
            index,
            day_name: get_day_name(preference.day_of_week, params.locale),
            valid: is_valid_preference(&preference, hours),
            preference,
        })
        .collect();

    let valid: Vec<SchedulePreference> = results
        .iter()
        .filter(|r| r.valid)
        .map(|r| r.preference.clone())
        .collect();

    Ok(Json(DataResponse {
        data: PreferenceValidation {
            all_valid: results.iter().all(|r| r.valid),
            summary: format_preferences_text(&valid, params.locale),
            results,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /schedules/preview
// ---------------------------------------------------------------------------

/// Where conflict annotations on a preview come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    /// No annotation; every slot reports zero conflicts.
    #[default]
    None,
    /// Popular-times heuristic, no database access.
    Heuristic,
    /// Count overlapping appointments already booked.
    Bookings,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub request: BulkScheduleRequest,
    #[serde(default)]
    pub conflicts: ConflictSource,
}

#[derive(Debug, Serialize)]
pub struct SchedulePreview {
    pub slots: Vec<GeneratedSlot>,
    pub span: ScheduleSpan,
    pub requested: u32,
    pub generated: usize,
    /// The one-year horizon ran out before `requested` slots were found.
    pub insufficient: bool,
    pub conflicting: usize,
}

/// Generate a bulk schedule and optionally annotate conflicts.
pub async fn preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewRequest>,
) -> AppResult<impl IntoResponse> {
    let request = body.request;
    request.validate()?;

    let hours = &state.config.business_hours;

    // The generator borrows a non-`Sync` check, so none may be held across
    // the database await below.
    let slots = match body.conflicts {
        ConflictSource::None => SlotGenerator::new(hours).generate(&request),
        ConflictSource::Heuristic => {
            let popular = PopularTimes::default();
            SlotGenerator::new(hours)
                .with_conflict_check(&popular)
                .generate(&request)
        }
        ConflictSource::Bookings => {
            let proposed = SlotGenerator::new(hours).generate(&request);
            let counts: HashMap<(NaiveDate, String), u32> =
                AppointmentRepo::count_conflicts(&state.pool, &proposed)
                    .await?
                    .into_iter()
                    .map(|row| {
                        let count = u32::try_from(row.count).unwrap_or(u32::MAX);
                        ((row.date, row.start_time), count)
                    })
                    .collect();

            let booked = |slot: &GeneratedSlot| -> u32 {
                counts
                    .get(&(slot.date, slot.start_time.clone()))
                    .copied()
                    .unwrap_or(0)
            };
            SlotGenerator::new(hours)
                .with_conflict_check(&booked)
                .generate(&request)
        }
    };

    let generated = slots.len();
    let conflicting = slots.iter().filter(|s| s.has_conflict).count();
    tracing::debug!(
        requested = request.count,
        generated,
        conflicting,
        "Schedule preview generated",
    );

    Ok(Json(DataResponse {
        data: SchedulePreview {
            span: calculate_schedule_span(&slots),
            requested: request.count,
            generated,
            insufficient: generated < request.count as usize,
            conflicting,
            slots,
        },
    }))
}
