//! Repository for the `package_purchases` table.

use babyspa_core::installments::PaymentPlan;
use babyspa_core::schedule_preference::stringify_schedule_preferences;
use babyspa_core::types::DbId;
use sqlx::PgPool;

use crate::models::package_purchase::{CreatePackagePurchase, PackagePurchase};

/// Column list for `package_purchases` SELECT queries.
const COLUMNS: &str = "\
    id, client_name, package_name, total_sessions, used_sessions, \
    total_price, final_price, payment_plan, installments, installment_amount, \
    paid_amount, installments_pay_on_sessions, schedule_preferences, \
    created_at, updated_at";

/// Provides CRUD operations for package purchases.
pub struct PackagePurchaseRepo;

impl PackagePurchaseRepo {
    /// Insert a new purchase. JSON list fields are serialized to text.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePackagePurchase,
    ) -> Result<PackagePurchase, sqlx::Error> {
        let plan = input.payment_plan.unwrap_or(PaymentPlan::Single);
        let installments = match plan {
            PaymentPlan::Single => 1,
            PaymentPlan::Installments => input.installments.unwrap_or(1),
        };
        let pay_on_sessions = input
            .installments_pay_on_sessions
            .as_ref()
            .and_then(|sessions| serde_json::to_string(sessions).ok());
        let preferences = input
            .schedule_preferences
            .as_deref()
            .map(stringify_schedule_preferences);

        let query = format!(
            "INSERT INTO package_purchases \
                (client_name, package_name, total_sessions, total_price, final_price, \
                 payment_plan, installments, installment_amount, \
                 installments_pay_on_sessions, schedule_preferences) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PackagePurchase>(&query)
            .bind(&input.client_name)
            .bind(&input.package_name)
            .bind(input.total_sessions)
            .bind(input.total_price)
            .bind(input.final_price)
            .bind(plan.as_str())
            .bind(installments)
            .bind(input.installment_amount)
            .bind(pay_on_sessions)
            .bind(preferences)
            .fetch_one(pool)
            .await
    }

    /// Find a purchase by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PackagePurchase>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM package_purchases WHERE id = $1");
        sqlx::query_as::<_, PackagePurchase>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List purchases, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PackagePurchase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM package_purchases \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, PackagePurchase>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
