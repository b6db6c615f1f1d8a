pub mod appointment;
pub mod health;
pub mod package_purchase;
pub mod schedule;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /schedules/business-hours                     active business-hours table
/// /schedules/available-times/{day_of_week}      bookable start times
/// /schedules/preferences/validate               preference check (POST)
/// /schedules/preview                            bulk slot preview (POST)
///
/// /package-purchases                            list, create
/// /package-purchases/{id}                       get
/// /package-purchases/{id}/installments          installment detail
/// /package-purchases/{id}/payment-summary       summary, next installment
/// /package-purchases/{id}/integrity             stored JSON health
/// /package-purchases/{id}/payments              list, register
///
/// /appointments                                 book (POST)
/// /appointments/{id}/complete                   complete (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/schedules", schedule::router())
        .nest("/package-purchases", package_purchase::router())
        .nest("/appointments", appointment::router())
}
