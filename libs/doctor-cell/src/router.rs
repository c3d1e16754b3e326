use axum::{routing::get, Router};

use shared_database::AppState;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    // Directory and slot lookups are public, like the booking UI's browse screens.
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}/slots", get(handlers::get_available_slots))
        .with_state(state)
}
