use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

/// Voice webhooks. The telephony provider calls these without a session.
pub fn ivr_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/ivr/welcome/", post(handlers::welcome))
        .route("/ivr/select_clinic/", post(handlers::select_clinic))
        .route("/ivr/handle_booking_type/{clinic_id}/", post(handlers::handle_booking_type))
        .route("/ivr/handle_specific_doctor/{clinic_id}/", post(handlers::handle_specific_doctor))
        .with_state(state)
}
