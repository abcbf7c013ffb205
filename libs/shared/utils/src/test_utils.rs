use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the database client at a wiremock server.
    pub fn with_database_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
        }
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn receptionist(username: &str) -> Self {
        Self::new(username, Role::Receptionist)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            created_at: Some(Utc::now()),
        }
    }

    pub fn bearer(&self, secret: &str) -> String {
        let token = issue_token(&self.to_user(), secret, 24)
            .expect("test secret is never empty");
        format!("Bearer {}", token)
    }
}

/// Row shapes as PostgREST returns them, including embedded relations.
pub struct MockDatabaseResponses;

impl MockDatabaseResponses {
    pub fn clinic_row(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "address": "12 MG Road",
            "city": "Pune",
            "latitude": 18.5204,
            "longitude": 73.8567
        })
    }

    pub fn doctor_row(id: i64, name: &str, clinic_id: Option<i64>) -> Value {
        json!({
            "id": id,
            "user_id": null,
            "name": name,
            "specialization": "General Medicine",
            "clinic_id": clinic_id,
            "role": "doctor",
            "user": null
        })
    }

    pub fn receptionist_row(id: i64, user_id: Uuid, clinic_id: Option<i64>) -> Value {
        json!({
            "id": id,
            "user_id": user_id,
            "clinic_id": clinic_id,
            "clinic": clinic_id.map(|id| json!({"id": id, "name": "City Clinic"}))
        })
    }

    pub fn patient_row(id: i64, name: &str, phone_number: Option<&str>, user_id: Option<Uuid>) -> Value {
        json!({
            "id": id,
            "user_id": user_id,
            "name": name,
            "age": 34,
            "phone_number": phone_number,
            "is_phone_verified": false,
            "otp": null,
            "otp_expiry": null,
            "user": null
        })
    }

    pub fn token_row(id: i64, token_number: i32, status: &str, date: NaiveDate) -> Value {
        json!({
            "id": id,
            "patient_id": 7,
            "doctor_id": 3,
            "clinic_id": 1,
            "token_number": token_number,
            "date": date,
            "created_at": "2026-10-19T08:00:00Z",
            "completed_at": null,
            "appointment_time": null,
            "status": status,
            "distance_km": null,
            "patient": Self::patient_row(7, "Ravi Kumar", Some("+919800000001"), None),
            "doctor": {"id": 3, "name": "Mehta"},
            "clinic": {"id": 1, "name": "City Clinic"}
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "code": code,
            "message": message
        })
    }
}
