use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::{auth_routes, hash_password};
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{MockDatabaseResponses, TestConfig};

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn account_row(id: Uuid, username: &str, password: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "password_hash": hash_password(password).unwrap(),
        "role": role,
        "is_active": true,
        "created_at": "2026-10-01T10:00:00Z"
    })
}

fn registration() -> Value {
    json!({
        "username": "ravi",
        "password": "clinic-visit-9",
        "password2": "clinic-visit-9",
        "name": "Ravi Kumar",
        "age": 34,
        "phone_number": "+919800000001"
    })
}

async fn mount_empty(server: &MockServer, table: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn registration_creates_account_and_patient() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let patient = MockDatabaseResponses::patient_row(7, "Ravi Kumar", Some("+919800000001"), Some(user_id));

    mount_empty(&server, "app_users").await;
    mount_empty(&server, "patients").await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/app_users"))
        .and(body_partial_json(json!({"username": "ravi", "role": "patient"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            account_row(user_id, "ravi", "clinic-visit-9", "patient")
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({"user_id": user_id, "phone_number": "+919800000001"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([patient.clone()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([patient])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri());
    let (status, body) = post(auth_routes(config.to_arc()), "/register/patient/", registration()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Patient registered successfully.");
    assert_eq!(body["user"]["role"], "patient");
    assert_eq!(body["user"]["phone_number"], "+919800000001");

    let user = validate_token(body["token"].as_str().unwrap(), &config.jwt_secret).unwrap();
    assert_eq!(user.id, user_id);
}

#[tokio::test]
async fn registration_claims_walk_in_record() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    mount_empty(&server, "app_users").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::patient_row(7, "IVR Patient 0001", Some("+919800000001"), None)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/app_users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            account_row(user_id, "ravi", "clinic-visit-9", "patient")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("user_id", "is.null"))
        .and(body_partial_json(json!({"user_id": user_id, "name": "Ravi Kumar", "age": 41})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::patient_row(7, "Ravi Kumar", Some("+919800000001"), Some(user_id))
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    // The signup form posts the age as text.
    let mut body = registration();
    body["age"] = json!("41");

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = post(auth_routes(config), "/register/patient/", body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], "Ravi Kumar");
}

#[tokio::test]
async fn registration_body_errors_are_json() {
    let config = TestConfig::default().to_arc();
    let mut body = registration();
    body["age"] = json!("forty");

    let (status, body) = post(auth_routes(config), "/register/patient/", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn failed_patient_write_removes_account() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    mount_empty(&server, "app_users").await;
    mount_empty(&server, "patients").await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/app_users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            account_row(user_id, "ravi", "clinic-visit-9", "patient")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockDatabaseResponses::error_response("insert failed", "XX000"),
        ))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/app_users"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, _) = post(auth_routes(config), "/register/patient/", registration()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn registration_rejects_taken_phone() {
    let server = MockServer::start().await;
    let owner = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/app_users"))
        .and(query_param("username", "eq.ravi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/app_users"))
        .and(query_param("id", format!("eq.{}", owner)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            account_row(owner, "someone", "other-pass-1", "patient")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::patient_row(7, "Someone", Some("+919800000001"), Some(owner))
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = post(auth_routes(config), "/register/patient/", registration()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This phone number is already registered.");
}

#[tokio::test]
async fn doctor_login_returns_profile_with_role() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/app_users"))
        .and(query_param("username", "eq.dr.mehta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            account_row(user_id, "dr.mehta", "stethoscope-1", "doctor")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_row(3, "Mehta", Some(1))
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let app = auth_routes(config);
    let credentials = json!({"username": "dr.mehta", "password": "stethoscope-1"});

    let (status, body) = post(app.clone(), "/login/", credentials.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "doctor");
    assert_eq!(body["user"]["name"], "Mehta");
    assert_eq!(body["user"]["specialization"], "General Medicine");

    let (status, _) = post(app, "/login/staff/", credentials).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/app_users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            account_row(Uuid::new_v4(), "ravi", "clinic-visit-9", "patient")
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = post(
        auth_routes(config),
        "/login/",
        json!({"username": "ravi", "password": "guess-again"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Credentials");
}

#[tokio::test]
async fn patients_cannot_use_staff_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/app_users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            account_row(Uuid::new_v4(), "ravi", "clinic-visit-9", "patient")
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = post(
        auth_routes(config),
        "/login/staff/",
        json!({"username": "ravi", "password": "clinic-visit-9"}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Staff access only.");
}

fn patient_with_otp(otp: &str, expires_in_minutes: i64, verified: bool) -> Value {
    let mut row = MockDatabaseResponses::patient_row(7, "Ravi Kumar", Some("+919800000001"), None);
    row["otp"] = json!(otp);
    row["otp_expiry"] = json!(Utc::now() + Duration::minutes(expires_in_minutes));
    row["is_phone_verified"] = json!(verified);
    row
}

#[tokio::test]
async fn otp_verification_marks_phone_verified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_otp("482910", 5, false)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({"is_phone_verified": true, "otp": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let app = auth_routes(config);

    let (status, body) = post(
        app.clone(),
        "/register/verify-otp/",
        json!({"phone_number": "+919800000001", "otp": "000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP.");

    let (status, body) = post(
        app,
        "/register/verify-otp/",
        json!({"phone_number": "+919800000001", "otp": "482910"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Phone number verified successfully.");
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_otp("482910", -1, false)
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let (status, body) = post(
        auth_routes(config),
        "/register/verify-otp/",
        json!({"phone_number": "+919800000001", "otp": "482910"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OTP has expired. Please request a new one.");
}

#[tokio::test]
async fn resend_otp_requires_unverified_phone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("phone_number", "eq.+919800000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            patient_with_otp("482910", 5, true)
        ])))
        .mount(&server)
        .await;
    mount_empty(&server, "patients").await;

    let config = TestConfig::with_database_url(&server.uri()).to_arc();
    let app = auth_routes(config);

    let (status, body) = post(app.clone(), "/register/resend-otp/", json!({"phone_number": "+919800000001"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Phone number is already verified.");

    let (status, _) = post(app, "/register/resend-otp/", json!({"phone_number": "+15550000000"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
