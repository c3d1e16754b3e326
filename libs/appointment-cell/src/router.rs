use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    // Every appointment route needs a signed-in caller; roles are checked per handler.
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/me", get(handlers::get_my_appointments))
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
