//! Appointment entity model and DTOs.

use babyspa_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// A row from the `appointments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Appointment {
    pub id: DbId,
    pub package_purchase_id: Option<DbId>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub created_at: Timestamp,
}

/// DTO for booking an appointment. The end time is derived from the
/// session duration.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    pub package_purchase_id: Option<DbId>,
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: u32,
}

/// Outcome of completing an appointment.
#[derive(Debug)]
pub enum Completion {
    Completed(Appointment),
    /// No scheduled appointment has that id.
    NotScheduled,
    /// The appointment's package has no unused session left.
    PackageExhausted,
}

/// Number of live appointments overlapping one proposed slot.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotBookingCount {
    pub date: NaiveDate,
    pub start_time: String,
    pub count: i64,
}
