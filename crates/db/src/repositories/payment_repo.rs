//! Repository for the `payments` table.

use babyspa_core::types::DbId;
use sqlx::PgPool;

use crate::models::payment::{Payment, RegisterPayment};

/// Column list for `payments` SELECT queries.
const COLUMNS: &str = "\
    id, package_purchase_id, installment_number, amount, payment_method, \
    notes, paid_at, created_at";

/// Provides query operations for payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// List payments for a purchase in the order they were made.
    pub async fn list_by_purchase(
        pool: &PgPool,
        package_purchase_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE package_purchase_id = $1 \
             ORDER BY paid_at, id"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(package_purchase_id)
            .fetch_all(pool)
            .await
    }

    /// Record a (possibly split) payment for one installment.
    ///
    /// Adds the total to the purchase's `paid_amount` and inserts one row per
    /// split in a single transaction. The update only matches while
    /// `paid_amount` still equals `expected_paid_amount`, the figure the
    /// caller validated the payment against; it also locks the purchase row
    /// until commit. Returns `None`, with nothing written, when another
    /// payment landed in between or the purchase does not exist.
    pub async fn create_split(
        pool: &PgPool,
        package_purchase_id: DbId,
        installment_number: i32,
        expected_paid_amount: f64,
        input: &RegisterPayment,
    ) -> Result<Option<Vec<Payment>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE package_purchases \
             SET paid_amount = paid_amount + $2, updated_at = NOW() \
             WHERE id = $1 AND paid_amount = $3",
        )
        .bind(package_purchase_id)
        .bind(input.total())
        .bind(expected_paid_amount)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::debug!(
                package_purchase_id,
                installment_number,
                "Payment rejected: purchase balance changed",
            );
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO payments \
                (package_purchase_id, installment_number, amount, payment_method, notes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );

        let mut rows = Vec::with_capacity(input.splits.len());
        for split in &input.splits {
            let row = sqlx::query_as::<_, Payment>(&query)
                .bind(package_purchase_id)
                .bind(installment_number)
                .bind(split.amount)
                .bind(split.method.as_str())
                .bind(input.notes.as_deref())
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;

        tracing::debug!(
            package_purchase_id,
            installment_number,
            rows = rows.len(),
            "Payment rows inserted",
        );
        Ok(Some(rows))
    }
}
