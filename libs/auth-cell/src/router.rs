use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

/// Registration and login. None of these routes require a session.
pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/register/patient/", post(handlers::register_patient))
        .route("/register/verify-otp/", post(handlers::verify_otp))
        .route("/register/resend-otp/", post(handlers::resend_otp))
        .route("/login/", post(handlers::login))
        .route("/login/staff/", post(handlers::staff_login))
        .with_state(state)
}
