use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::UserRef;

/// Select clause that embeds the linked account, when there is one.
pub const PATIENT_SELECT: &str = "*,user:app_users(id,username)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub age: i32,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_phone_verified: bool,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub otp_expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

impl Patient {
    /// A walk-in record created by reception or the phone line, not yet tied to an account.
    pub fn is_walk_in(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientView {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub user: Option<UserRef>,
    pub phone_number: Option<String>,
}

impl From<&Patient> for PatientView {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            age: patient.age,
            user: patient.user.clone(),
            phone_number: patient.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub name: String,
    pub age: i32,
    pub phone_number: Option<String>,
    pub user_id: Option<Uuid>,
}
