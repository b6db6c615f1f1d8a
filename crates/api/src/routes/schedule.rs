//! Route definitions for scheduling helpers mounted at `/schedules`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

/// ```text
/// GET    /business-hours                  -> business_hours
/// GET    /available-times/{day_of_week}   -> available_times
/// POST   /preferences/validate            -> validate_preferences
/// POST   /preview                         -> preview
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/business-hours", get(schedule::business_hours))
        .route(
            "/available-times/{day_of_week}",
            get(schedule::available_times),
        )
        .route(
            "/preferences/validate",
            post(schedule::validate_preferences),
        )
        .route("/preview", post(schedule::preview))
}
