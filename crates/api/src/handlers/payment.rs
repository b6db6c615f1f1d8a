//! Handlers for payments against a package purchase.
//!
//! A payment settles one installment and may be split across several
//! methods (cash, card, transfer, QR). Each split is stored as its own row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use babyspa_core::error::CoreError;
use babyspa_core::installments::{
    first_unpaid, get_installments_detail, installment_due, InstallmentDetail, InstallmentStatus,
};
use babyspa_core::payments::{validate_installment_payment, validate_split_payment, MONEY_EPSILON};
use babyspa_core::types::DbId;
use babyspa_db::models::payment::{Payment, RegisterPayment};
use babyspa_db::repositories::PaymentRepo;
use serde::Serialize;

use super::package_purchase::{ensure_purchase, installment_payments};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /package-purchases/{id}/payments
// ---------------------------------------------------------------------------

/// List payments for a purchase in the order they were made.
pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_purchase(&state, id).await?;
    let payments = PaymentRepo::list_by_purchase(&state.pool, id).await?;
    Ok(Json(DataResponse { data: payments }))
}

// ---------------------------------------------------------------------------
// POST /package-purchases/{id}/payments
// ---------------------------------------------------------------------------

/// Pick the installment a payment settles.
///
/// Installments are paid in order: an explicit number must be the first
/// unpaid one, which is also the default.
fn target_installment(
    details: &[InstallmentDetail],
    requested: Option<u32>,
) -> Result<&InstallmentDetail, CoreError> {
    let next = first_unpaid(details);
    let number = match requested {
        Some(n) => n,
        None => next
            .ok_or_else(|| CoreError::Conflict("All installments are already paid".to_string()))?,
    };

    let detail = details
        .iter()
        .find(|d| d.number == number)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Installment {number} does not exist (purchase has {})",
                details.len()
            ))
        })?;

    if detail.status == InstallmentStatus::Paid {
        return Err(CoreError::Conflict(format!(
            "Installment {number} is already paid"
        )));
    }
    if let Some(next) = next.filter(|n| *n != number) {
        return Err(CoreError::Validation(format!(
            "Installment {next} must be paid before installment {number}"
        )));
    }
    Ok(detail)
}

#[derive(Debug, Serialize)]
pub struct RegisteredPayment {
    pub installment_number: u32,
    pub amount: f64,
    pub payments: Vec<Payment>,
}

/// Register a (possibly split) payment for one installment.
pub async fn register_payment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RegisterPayment>,
) -> AppResult<impl IntoResponse> {
    let purchase = ensure_purchase(&state, id).await?;
    let terms = purchase.terms();
    let payments = installment_payments(&state, id).await?;
    let details = get_installments_detail(&terms, &payments);

    let detail = target_installment(&details, input.installment_number)?;
    let remaining = terms.total_amount() - terms.paid_amount;
    if remaining <= MONEY_EPSILON {
        return Err(CoreError::Conflict("Purchase is already fully paid".to_string()).into());
    }

    let installment_number = detail.number;
    let amount = input
        .amount
        .unwrap_or_else(|| installment_due(&terms, installment_number));
    validate_split_payment(amount, &input.splits)?;
    validate_installment_payment(&terms, installment_number, amount)?;

    let stored_number = i32::try_from(installment_number)
        .map_err(|_| CoreError::Validation("Installment number out of range".to_string()))?;
    let rows = PaymentRepo::create_split(&state.pool, id, stored_number, terms.paid_amount, &input)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!(
                "Purchase {id} received another payment meanwhile; reload and retry"
            ))
        })?;

    tracing::info!(
        purchase_id = id,
        installment_number,
        amount,
        splits = rows.len(),
        "Payment registered",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RegisteredPayment {
                installment_number,
                amount,
                payments: rows,
            },
        }),
    ))
}
