use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn clinic_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/public/clinics/", get(handlers::public_clinics));

    let protected_routes = Router::new()
        .route("/clinics_with_doctors/", get(handlers::clinics_with_doctors))
        .route("/doctors/", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}/available-slots/{date}/", get(handlers::available_slots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
