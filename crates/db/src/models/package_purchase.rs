//! Package purchase entity model and DTOs.
//!
//! A purchase is a client's prepaid bundle of sessions. Installment
//! schedules and weekly preferences are stored as JSON text and interpreted
//! by `babyspa_core`.

use babyspa_core::installments::{PaymentPlan, PurchaseTerms};
use babyspa_core::schedule_preference::SchedulePreference;
use babyspa_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `package_purchases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PackagePurchase {
    pub id: DbId,
    pub client_name: String,
    pub package_name: String,
    pub total_sessions: i32,
    pub used_sessions: i32,
    pub total_price: f64,
    pub final_price: Option<f64>,
    pub payment_plan: String,
    pub installments: i32,
    pub installment_amount: Option<f64>,
    pub paid_amount: f64,
    pub installments_pay_on_sessions: Option<String>,
    pub schedule_preferences: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl PackagePurchase {
    pub fn remaining_sessions(&self) -> i32 {
        (self.total_sessions - self.used_sessions).max(0)
    }

    /// The view of this purchase the installment calculator works on.
    pub fn terms(&self) -> PurchaseTerms {
        let payment_plan = self.payment_plan.parse().unwrap_or(if self.installments > 1 {
            PaymentPlan::Installments
        } else {
            PaymentPlan::Single
        });

        PurchaseTerms {
            total_sessions: non_negative(self.total_sessions),
            used_sessions: non_negative(self.used_sessions),
            payment_plan,
            installments: non_negative(self.installments),
            installment_amount: self.installment_amount,
            total_price: self.total_price,
            final_price: self.final_price,
            paid_amount: self.paid_amount,
            installments_pay_on_sessions: self.installments_pay_on_sessions.clone(),
        }
    }
}

/// DTO for creating a package purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackagePurchase {
    pub client_name: String,
    pub package_name: String,
    pub total_sessions: i32,
    pub total_price: f64,
    pub final_price: Option<f64>,
    pub payment_plan: Option<PaymentPlan>,
    pub installments: Option<i32>,
    pub installment_amount: Option<f64>,
    /// Session number at which each installment falls due.
    pub installments_pay_on_sessions: Option<Vec<u32>>,
    pub schedule_preferences: Option<Vec<SchedulePreference>>,
}
