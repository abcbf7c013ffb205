use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use auth_cell::auth_routes;
use clinic_cell::clinic_routes;
use consultation_cell::consultation_routes;
use ivr_cell::ivr_routes;
use shared_config::AppConfig;
use token_cell::token_routes;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "clinic-queue-api",
    }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(clinic_routes(state.clone()))
        .merge(token_routes(state.clone()))
        .merge(consultation_routes(state.clone()))
        .merge(ivr_routes(state));

    Router::new()
        .route("/", get(health))
        .nest("/api", api)
}
