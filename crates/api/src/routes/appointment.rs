//! Route definitions for appointments mounted at `/appointments`.

use axum::routing::post;
use axum::Router;

use crate::handlers::appointment;
use crate::state::AppState;

/// ```text
/// POST   /                 -> create_appointment
/// POST   /{id}/complete    -> complete_appointment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(appointment::create_appointment))
        .route("/{id}/complete", post(appointment::complete_appointment))
}
