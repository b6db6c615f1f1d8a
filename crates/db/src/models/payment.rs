//! Payment entity model and DTOs.

use babyspa_core::installments::InstallmentPayment;
use babyspa_core::payments::PaymentSplit;
use babyspa_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub package_purchase_id: DbId,
    pub installment_number: Option<i32>,
    pub amount: f64,
    pub payment_method: String,
    pub notes: Option<String>,
    pub paid_at: Timestamp,
    pub created_at: Timestamp,
}

impl Payment {
    pub fn as_installment_payment(&self) -> InstallmentPayment {
        InstallmentPayment {
            installment_number: self
                .installment_number
                .and_then(|n| u32::try_from(n).ok()),
            amount: self.amount,
        }
    }
}

/// Request body for registering a payment.
///
/// `installment_number` defaults to the first unpaid installment and
/// `amount` to that installment's balance when omitted. Each split becomes
/// its own row.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayment {
    pub installment_number: Option<u32>,
    pub amount: Option<f64>,
    pub splits: Vec<PaymentSplit>,
    pub notes: Option<String>,
}

impl RegisterPayment {
    pub fn total(&self) -> f64 {
        self.splits.iter().map(|s| s.amount).sum()
    }
}
