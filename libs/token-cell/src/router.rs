use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn token_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/tokens/", get(handlers::list_clinic_tokens).post(handlers::staff_create_token))
        .route("/tokens/patient_create/", post(handlers::patient_create_token))
        .route("/tokens/get_my_token/", get(handlers::get_my_token))
        .route("/tokens/confirm_arrival/", post(handlers::confirm_arrival))
        .route("/tokens/patient_cancel/", post(handlers::patient_cancel_token))
        .route("/tokens/{id}/update_status/", patch(handlers::update_token_status))
        .route("/patient/live-queue/{doctor_id}/", get(handlers::live_queue))
        .route("/analytics/", get(handlers::clinic_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
