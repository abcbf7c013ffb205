use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::UserRef;

pub const DOCTOR_SELECT: &str = "*,user:app_users(id,username)";
pub const RECEPTIONIST_SELECT: &str = "*,clinic:clinics(id,name)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Clinic {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicView {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
}

impl From<&Clinic> for ClinicView {
    fn from(clinic: &Clinic) -> Self {
        Self {
            id: clinic.id,
            name: clinic.name.clone(),
            address: clinic.address.clone(),
            city: clinic.city.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub specialization: String,
    pub clinic_id: Option<i64>,
    #[serde(default = "default_doctor_role")]
    pub role: String,
    #[serde(default)]
    pub user: Option<UserRef>,
}

fn default_doctor_role() -> String {
    "doctor".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorView {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub user: Option<UserRef>,
}

impl From<&Doctor> for DoctorView {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            specialization: doctor.specialization.clone(),
            user: doctor.user.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receptionist {
    pub id: i64,
    pub user_id: Uuid,
    pub clinic_id: Option<i64>,
    #[serde(default)]
    pub clinic: Option<ClinicRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClinicWithDoctors {
    #[serde(flatten)]
    pub clinic: ClinicView,
    pub doctors: Vec<DoctorView>,
    pub average_wait_time: i64,
    pub total_tokens: usize,
}

/// The subset of a token row needed for clinic-level counters.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStat {
    pub clinic_id: Option<i64>,
    pub doctor_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub slot_minutes: i64,
    pub available_slots: Vec<String>,
}
