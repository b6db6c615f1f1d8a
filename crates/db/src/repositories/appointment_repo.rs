//! Repository for the `appointments` table.
//!
//! Also answers the availability question the slot generator leaves open:
//! how many live bookings overlap each proposed slot.

use babyspa_core::slot_generator::GeneratedSlot;
use babyspa_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::appointment::{
    Appointment, Completion, CreateAppointment, SlotBookingCount, STATUS_CANCELLED,
    STATUS_COMPLETED, STATUS_SCHEDULED,
};

/// Column list for `appointments` SELECT queries.
const COLUMNS: &str =
    "id, package_purchase_id, date, start_time, end_time, status, created_at";

fn insert_query() -> String {
    format!(
        "INSERT INTO appointments (package_purchase_id, date, start_time, end_time) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {COLUMNS}"
    )
}

/// Provides query operations for appointments.
pub struct AppointmentRepo;

impl AppointmentRepo {
    /// Book an appointment. `end_time` is computed by the caller.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAppointment,
        end_time: &str,
    ) -> Result<Appointment, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(&insert_query())
            .bind(input.package_purchase_id)
            .bind(input.date)
            .bind(&input.start_time)
            .bind(end_time)
            .fetch_one(pool)
            .await
    }

    /// Book an appointment against a package purchase.
    ///
    /// Locks the purchase row and books only while unused sessions exceed
    /// the appointments already scheduled on it. Returns `None`, with
    /// nothing written, when the package is fully booked or missing.
    pub async fn create_within_package(
        pool: &PgPool,
        package_purchase_id: DbId,
        input: &CreateAppointment,
        end_time: &str,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let remaining: Option<i32> = sqlx::query_scalar(
            "SELECT total_sessions - used_sessions FROM package_purchases \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(package_purchase_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(remaining) = remaining else {
            return Ok(None);
        };

        let scheduled: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments \
             WHERE package_purchase_id = $1 AND status = $2",
        )
        .bind(package_purchase_id)
        .bind(STATUS_SCHEDULED)
        .fetch_one(&mut *tx)
        .await?;

        if i64::from(remaining) - scheduled <= 0 {
            tracing::debug!(
                package_purchase_id,
                remaining,
                scheduled,
                "Booking rejected: package fully booked",
            );
            return Ok(None);
        }

        let appointment = sqlx::query_as::<_, Appointment>(&insert_query())
            .bind(package_purchase_id)
            .bind(input.date)
            .bind(&input.start_time)
            .bind(end_time)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(appointment))
    }

    /// Find an appointment by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a scheduled appointment completed and count the session against
    /// its package.
    ///
    /// The package counter never passes `total_sessions`; if it would, the
    /// whole completion is rolled back.
    pub async fn mark_completed(pool: &PgPool, id: DbId) -> Result<Completion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE appointments SET status = $2 \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(STATUS_SCHEDULED)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(appointment) = appointment else {
            return Ok(Completion::NotScheduled);
        };

        if let Some(purchase_id) = appointment.package_purchase_id {
            let updated = sqlx::query(
                "UPDATE package_purchases \
                 SET used_sessions = used_sessions + 1, updated_at = NOW() \
                 WHERE id = $1 AND used_sessions < total_sessions",
            )
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                tracing::debug!(
                    appointment_id = id,
                    purchase_id,
                    "Completion rejected: package exhausted",
                );
                return Ok(Completion::PackageExhausted);
            }
        }

        tx.commit().await?;
        Ok(Completion::Completed(appointment))
    }

    /// Count live appointments overlapping each slot.
    ///
    /// Slots with no overlapping booking are absent from the result.
    pub async fn count_conflicts(
        pool: &PgPool,
        slots: &[GeneratedSlot],
    ) -> Result<Vec<SlotBookingCount>, sqlx::Error> {
        if slots.is_empty() {
            return Ok(vec![]);
        }

        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        let starts: Vec<String> = slots.iter().map(|s| s.start_time.clone()).collect();
        let ends: Vec<String> = slots.iter().map(|s| s.end_time.clone()).collect();

        sqlx::query_as::<_, SlotBookingCount>(
            "SELECT s.date, s.start_time, COUNT(a.id) AS count \
             FROM UNNEST($1::DATE[], $2::VARCHAR[], $3::VARCHAR[]) \
                AS s(date, start_time, end_time) \
             JOIN appointments a \
                ON a.date = s.date \
               AND a.status <> $4 \
               AND a.start_time < s.end_time \
               AND a.end_time > s.start_time \
             GROUP BY s.date, s.start_time",
        )
        .bind(dates)
        .bind(starts)
        .bind(ends)
        .bind(STATUS_CANCELLED)
        .fetch_all(pool)
        .await
    }
}
