use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_cell::clinic_routes;
use shared_utils::test_utils::{MockDatabaseResponses, TestConfig, TestUser};

async fn call(app: Router, uri: &str, bearer: Option<String>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(bearer) = bearer {
        request = request.header("Authorization", bearer);
    }

    let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn public_clinics_include_doctors_and_daily_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::clinic_row(1, "City Clinic")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_row(3, "Mehta", Some(1)),
            MockDatabaseResponses::doctor_row(4, "Rao", None)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"clinic_id": 1, "doctor_id": 3, "status": "completed",
             "created_at": "2026-10-19T09:00:00Z", "completed_at": "2026-10-19T09:20:00Z"},
            {"clinic_id": 1, "doctor_id": 3, "status": "waiting",
             "created_at": "2026-10-19T09:05:00Z", "completed_at": null}
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = call(clinic_routes(config), "/public/clinics/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "City Clinic");
    assert_eq!(body[0]["doctors"].as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["doctors"][0]["name"], "Mehta");
    assert_eq!(body[0]["total_tokens"], 2);
    assert_eq!(body[0]["average_wait_time"], 20);
    assert!(body[0].get("latitude").is_none());
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let config = TestConfig::default().to_arc();
    let (status, _) = call(clinic_routes(config), "/doctors/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn patients_see_no_clinic_doctors() {
    let test_config = TestConfig::default();
    let bearer = TestUser::patient("ravi").bearer(&test_config.jwt_secret);

    let (status, body) = call(clinic_routes(test_config.to_arc()), "/doctors/", Some(bearer)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn available_slots_skip_booked_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_row(3, "Mehta", Some(1))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tokens"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"appointment_time": "09:00:00"},
            {"appointment_time": "10:15:00"}
        ])))
        .mount(&server)
        .await;

    let test_config = TestConfig::with_database_url(&server.uri());
    let bearer = TestUser::patient("ravi").bearer(&test_config.jwt_secret);
    let date = Utc::now().date_naive() + Duration::days(2);

    let (status, body) = call(
        clinic_routes(test_config.to_arc()),
        &format!("/doctors/3/available-slots/{}/", date),
        Some(bearer),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot_minutes"], 15);
    let slots = body["available_slots"].as_array().unwrap();
    assert_eq!(slots.len(), 30);
    assert_eq!(slots[0], "09:15");
    assert!(!slots.contains(&json!("10:15")));
}

#[tokio::test]
async fn available_slots_reject_bad_dates_and_unknown_doctors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let test_config = TestConfig::with_database_url(&server.uri());
    let bearer = TestUser::receptionist("asha").bearer(&test_config.jwt_secret);
    let app = clinic_routes(test_config.to_arc());

    let (status, body) = call(app.clone(), "/doctors/3/available-slots/19-10-2026/", Some(bearer.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD.");

    let (status, _) = call(app, "/doctors/99/available-slots/2030-01-01/", Some(bearer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
