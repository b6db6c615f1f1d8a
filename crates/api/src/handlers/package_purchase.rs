//! Handlers for package purchases and their installment plans.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use babyspa_core::business_hours::BusinessHoursConfig;
use babyspa_core::error::CoreError;
use babyspa_core::installments::{
    get_installments_detail, get_next_installment_to_pay, get_payment_summary,
    has_pending_installments, suggest_pay_on_sessions, try_parse_pay_on_sessions,
    validate_pay_on_sessions, InstallmentPayment, PaymentPlan, PaymentSummary,
};
use babyspa_core::json_list::{JsonListError, ParsedList};
use babyspa_core::schedule_preference::{is_valid_preference, try_parse_schedule_preferences};
use babyspa_core::types::DbId;
use babyspa_db::models::package_purchase::{CreatePackagePurchase, PackagePurchase};
use babyspa_db::models::payment::Payment;
use babyspa_db::repositories::{PackagePurchaseRepo, PaymentRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a purchase or fail with 404.
pub(crate) async fn ensure_purchase(state: &AppState, id: DbId) -> AppResult<PackagePurchase> {
    PackagePurchaseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PackagePurchase",
            id,
        }))
}

/// Payments of a purchase in the shape the installment calculator reads.
pub(crate) async fn installment_payments(
    state: &AppState,
    id: DbId,
) -> AppResult<Vec<InstallmentPayment>> {
    let payments = PaymentRepo::list_by_purchase(&state.pool, id).await?;
    Ok(payments.iter().map(Payment::as_installment_payment).collect())
}

// ---------------------------------------------------------------------------
// POST /package-purchases
// ---------------------------------------------------------------------------

/// Check a new purchase and fill in the pay-on-session schedule when an
/// installment plan omits it.
fn prepare_purchase(
    input: &mut CreatePackagePurchase,
    hours: &BusinessHoursConfig,
) -> Result<(), CoreError> {
    if input.client_name.trim().is_empty() || input.package_name.trim().is_empty() {
        return Err(CoreError::Validation(
            "client_name and package_name are required".to_string(),
        ));
    }
    if input.total_sessions <= 0 {
        return Err(CoreError::Validation(
            "total_sessions must be greater than zero".to_string(),
        ));
    }
    let prices = [Some(input.total_price), input.final_price, input.installment_amount];
    if prices.into_iter().flatten().any(|p| !p.is_finite() || p < 0.0) {
        return Err(CoreError::Validation(
            "Prices must be non-negative numbers".to_string(),
        ));
    }

    if let Some(preferences) = &input.schedule_preferences {
        if let Some(bad) = preferences.iter().find(|p| !is_valid_preference(p, hours)) {
            return Err(CoreError::Validation(format!(
                "Schedule preference day {} at {} is outside business hours",
                bad.day_of_week, bad.time
            )));
        }
    }

    let total_sessions = input.total_sessions.unsigned_abs();
    match input.payment_plan.unwrap_or(PaymentPlan::Single) {
        PaymentPlan::Single => {
            input.installments = Some(1);
            input.installments_pay_on_sessions = None;
        }
        PaymentPlan::Installments => {
            let installments = input.installments.unwrap_or(0);
            if installments < 1 || installments > input.total_sessions {
                return Err(CoreError::Validation(format!(
                    "installments must be between 1 and {total_sessions}"
                )));
            }
            let installments = installments.unsigned_abs();
            match &input.installments_pay_on_sessions {
                Some(sessions) => {
                    validate_pay_on_sessions(sessions, total_sessions, installments)?;
                }
                None => {
                    input.installments_pay_on_sessions =
                        Some(suggest_pay_on_sessions(total_sessions, installments));
                }
            }
        }
    }
    Ok(())
}

/// Create a package purchase.
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(mut input): Json<CreatePackagePurchase>,
) -> AppResult<impl IntoResponse> {
    prepare_purchase(&mut input, &state.config.business_hours)?;

    let purchase = PackagePurchaseRepo::create(&state.pool, &input).await?;
    tracing::info!(
        purchase_id = purchase.id,
        plan = %purchase.payment_plan,
        installments = purchase.installments,
        "Package purchase created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: purchase })))
}

// ---------------------------------------------------------------------------
// GET /package-purchases
// ---------------------------------------------------------------------------

/// List purchases, newest first.
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let purchases =
        PackagePurchaseRepo::list(&state.pool, params.limit(), params.offset()).await?;
    Ok(Json(DataResponse { data: purchases }))
}

// ---------------------------------------------------------------------------
// GET /package-purchases/{id}
// ---------------------------------------------------------------------------

pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let purchase = ensure_purchase(&state, id).await?;
    Ok(Json(DataResponse { data: purchase }))
}

// ---------------------------------------------------------------------------
// GET /package-purchases/{id}/installments
// ---------------------------------------------------------------------------

/// Per-installment amount, due session and status.
pub async fn get_installments(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let purchase = ensure_purchase(&state, id).await?;
    let payments = installment_payments(&state, id).await?;

    let details = get_installments_detail(&purchase.terms(), &payments);
    Ok(Json(DataResponse { data: details }))
}

// ---------------------------------------------------------------------------
// GET /package-purchases/{id}/payment-summary
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PaymentSummaryResponse {
    #[serde(flatten)]
    pub summary: PaymentSummary,
    pub has_pending: bool,
    pub next_installment: Option<u32>,
    pub remaining_sessions: i32,
}

pub async fn payment_summary(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let purchase = ensure_purchase(&state, id).await?;
    let terms = purchase.terms();

    Ok(Json(DataResponse {
        data: PaymentSummaryResponse {
            summary: get_payment_summary(&terms),
            has_pending: has_pending_installments(&terms),
            next_installment: get_next_installment_to_pay(&terms),
            remaining_sessions: purchase.remaining_sessions(),
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /package-purchases/{id}/integrity
// ---------------------------------------------------------------------------

/// Health of one stored JSON list column.
#[derive(Debug, Serialize)]
pub struct FieldIntegrity {
    pub field: &'static str,
    /// `absent`, `ok`, `partial` (some entries dropped) or `malformed`.
    pub status: &'static str,
    pub entries: usize,
    pub dropped: usize,
    pub error: Option<String>,
}

impl FieldIntegrity {
    fn inspect<T>(
        field: &'static str,
        stored: Option<&str>,
        parse: impl Fn(&str) -> Result<ParsedList<T>, JsonListError>,
    ) -> Self {
        let Some(json) = stored else {
            return Self {
                field,
                status: "absent",
                entries: 0,
                dropped: 0,
                error: None,
            };
        };

        match parse(json) {
            Ok(list) => Self {
                field,
                status: if list.is_clean() { "ok" } else { "partial" },
                entries: list.items.len(),
                dropped: list.dropped,
                error: None,
            },
            Err(e) => Self {
                field,
                status: "malformed",
                entries: 0,
                dropped: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub purchase_id: DbId,
    pub healthy: bool,
    pub fields: Vec<FieldIntegrity>,
}

/// Report stored JSON list columns that no longer parse cleanly.
pub async fn get_integrity(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let purchase = ensure_purchase(&state, id).await?;

    let fields = vec![
        FieldIntegrity::inspect(
            "schedule_preferences",
            purchase.schedule_preferences.as_deref(),
            try_parse_schedule_preferences,
        ),
        FieldIntegrity::inspect(
            "installments_pay_on_sessions",
            purchase.installments_pay_on_sessions.as_deref(),
            try_parse_pay_on_sessions,
        ),
    ];
    let healthy = fields.iter().all(|f| matches!(f.status, "ok" | "absent"));
    if !healthy {
        tracing::warn!(purchase_id = id, "Stored JSON list failed to parse cleanly");
    }

    Ok(Json(DataResponse {
        data: IntegrityReport {
            purchase_id: id,
            healthy,
            fields,
        },
    }))
}
