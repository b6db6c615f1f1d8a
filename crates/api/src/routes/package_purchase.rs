//! Route definitions for package purchases mounted at `/package-purchases`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{package_purchase, payment};
use crate::state::AppState;

/// ```text
/// GET, POST  /                        -> list_purchases, create_purchase
/// GET        /{id}                    -> get_purchase
/// GET        /{id}/installments       -> get_installments
/// GET        /{id}/payment-summary    -> payment_summary
/// GET        /{id}/integrity          -> get_integrity
/// GET, POST  /{id}/payments           -> list_payments, register_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(package_purchase::list_purchases).post(package_purchase::create_purchase),
        )
        .route("/{id}", get(package_purchase::get_purchase))
        .route("/{id}/installments", get(package_purchase::get_installments))
        .route(
            "/{id}/payment-summary",
            get(package_purchase::payment_summary),
        )
        .route("/{id}/integrity", get(package_purchase::get_integrity))
        .route(
            "/{id}/payments",
            get(payment::list_payments).post(payment::register_payment),
        )
}
