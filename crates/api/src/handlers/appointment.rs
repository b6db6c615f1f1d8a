//! Handlers for booking and completing sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use babyspa_core::business_hours::BusinessHoursConfig;
use babyspa_core::error::CoreError;
use babyspa_core::time_of_day::{calculate_end_time, is_valid_time_format};
use babyspa_core::types::{DayOfWeek, DbId};
use babyspa_db::models::appointment::{Completion, CreateAppointment};
use babyspa_db::repositories::AppointmentRepo;
use chrono::Datelike;

use super::package_purchase::ensure_purchase;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Check the requested start against business hours and derive the end time.
fn booking_end_time(
    input: &CreateAppointment,
    hours: &BusinessHoursConfig,
) -> Result<String, CoreError> {
    if !is_valid_time_format(&input.start_time) {
        return Err(CoreError::Validation(format!(
            "Invalid start time '{}', expected HH:MM",
            input.start_time
        )));
    }
    if input.duration_minutes == 0 {
        return Err(CoreError::Validation(
            "duration_minutes must be greater than zero".to_string(),
        ));
    }

    let day = input.date.weekday().num_days_from_sunday() as DayOfWeek;
    if !hours.is_within(day, &input.start_time) {
        return Err(CoreError::Validation(format!(
            "{} at {} is outside business hours",
            input.date, input.start_time
        )));
    }
    calculate_end_time(&input.start_time, input.duration_minutes)
}

// ---------------------------------------------------------------------------
// POST /appointments
// ---------------------------------------------------------------------------

/// Book a session, optionally against a package purchase.
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(input): Json<CreateAppointment>,
) -> AppResult<impl IntoResponse> {
    let end_time = booking_end_time(&input, &state.config.business_hours)?;

    let appointment = match input.package_purchase_id {
        Some(purchase_id) => {
            ensure_purchase(&state, purchase_id).await?;
            AppointmentRepo::create_within_package(&state.pool, purchase_id, &input, &end_time)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Package purchase {purchase_id} has no sessions left to book"
                    )))
                })?
        }
        None => AppointmentRepo::create(&state.pool, &input, &end_time).await?,
    };
    tracing::info!(
        appointment_id = appointment.id,
        date = %appointment.date,
        start_time = %appointment.start_time,
        "Appointment booked",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: appointment })))
}

// ---------------------------------------------------------------------------
// POST /appointments/{id}/complete
// ---------------------------------------------------------------------------

/// Mark a scheduled session completed, consuming one package session.
pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    match AppointmentRepo::mark_completed(&state.pool, id).await? {
        Completion::Completed(appointment) => {
            tracing::info!(appointment_id = id, "Appointment completed");
            return Ok(Json(DataResponse { data: appointment }));
        }
        Completion::PackageExhausted => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Appointment {id} belongs to a package with no sessions left"
            ))));
        }
        Completion::NotScheduled => {}
    }

    match AppointmentRepo::find_by_id(&state.pool, id).await? {
        Some(existing) => Err(AppError::Core(CoreError::Conflict(format!(
            "Appointment {id} is {}, not scheduled",
            existing.status
        )))),
        None => Err(AppError::Core(CoreError::NotFound {
            entity: "Appointment",
            id,
        })),
    }
}
