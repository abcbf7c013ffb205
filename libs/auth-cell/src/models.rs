use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinic_cell::{ClinicRef, DoctorView};
use patient_cell::PatientView;
use shared_models::auth::{Role, User};
use shared_models::extract::optional_number;

/// Row of `app_users`. The hash never leaves this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct AppUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl AppUser {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    pub age: Option<i32>,
    pub phone_number: Option<String>,
}

/// A registration request with every field present and trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub phone_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResendOtpRequest {
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub username: String,
    pub name: String,
    pub age: i32,
    pub role: Role,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: RegisteredUser,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceptionistView {
    pub username: String,
    pub clinic: Option<ClinicRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Doctor(DoctorView),
    Receptionist(ReceptionistView),
    Patient(PatientView),
}

/// The profile fields flattened next to the account role.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithRole {
    #[serde(flatten)]
    pub profile: Profile,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: ProfileWithRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub fn welcome_message(name: &str) -> String {
    format!("Welcome to the Clinic Portal, {}! Your registration was successful.", name)
}

pub fn otp_message(otp: &str, ttl_minutes: i64) -> String {
    format!(
        "Your Clinic Portal verification code is {}. It expires in {} minutes.",
        otp, ttl_minutes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receptionist_profile_flattens_with_role() {
        let user = ProfileWithRole {
            profile: Profile::Receptionist(ReceptionistView {
                username: "asha".to_string(),
                clinic: Some(ClinicRef { id: 1, name: "City Clinic".to_string() }),
            }),
            role: Role::Receptionist,
        };

        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"username": "asha", "clinic": {"id": 1, "name": "City Clinic"}, "role": "receptionist"})
        );
    }

    #[test]
    fn accounts_default_to_active() {
        let row: AppUser = serde_json::from_value(json!({
            "id": "5b0d2f5e-8f4a-4b8e-9a51-0f7f3c2f1a10",
            "username": "ravi",
            "password_hash": "$argon2id$...",
            "role": "patient"
        }))
        .unwrap();

        assert!(row.is_active);
        assert_eq!(row.to_user().role, Role::Patient);
    }
}
