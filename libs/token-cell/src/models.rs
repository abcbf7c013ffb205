use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_cell::ClinicRef;
use patient_cell::{Patient, PatientView};
use shared_models::extract::optional_number;

pub const TOKEN_SELECT: &str =
    "*,patient:patients(*,user:app_users(id,username)),doctor:doctors(id,name),clinic:clinics(id,name)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Waiting,
    Confirmed,
    InConsultancy,
    Completed,
    Cancelled,
    Skipped,
}

impl TokenStatus {
    /// Everything except the two terminal states.
    pub const ACTIVE: [TokenStatus; 4] = [
        TokenStatus::Waiting,
        TokenStatus::Confirmed,
        TokenStatus::InConsultancy,
        TokenStatus::Skipped,
    ];

    /// Tokens still expected in the doctor's room today.
    pub const IN_QUEUE: [TokenStatus; 3] = [
        TokenStatus::Waiting,
        TokenStatus::Confirmed,
        TokenStatus::InConsultancy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::Confirmed => "confirmed",
            TokenStatus::InConsultancy => "in_consultancy",
            TokenStatus::Completed => "completed",
            TokenStatus::Cancelled => "cancelled",
            TokenStatus::Skipped => "skipped",
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TokenStatus) -> bool {
        use TokenStatus::*;

        match self {
            Waiting => matches!(next, Confirmed | InConsultancy | Completed | Cancelled | Skipped),
            Confirmed => matches!(next, InConsultancy | Completed | Cancelled | Skipped),
            InConsultancy => matches!(next, Completed | Cancelled),
            Skipped => matches!(next, Confirmed | InConsultancy | Cancelled),
            Completed | Cancelled => false,
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TokenStatus::Waiting),
            "confirmed" => Ok(TokenStatus::Confirmed),
            "in_consultancy" => Ok(TokenStatus::InConsultancy),
            "completed" => Ok(TokenStatus::Completed),
            "cancelled" => Ok(TokenStatus::Cancelled),
            "skipped" => Ok(TokenStatus::Skipped),
            other => Err(format!("Unknown token status: {}", other)),
        }
    }
}

/// PostgREST `in.(...)` filter value for a set of statuses.
pub fn status_filter(statuses: &[TokenStatus]) -> String {
    let names: Vec<&str> = statuses.iter().map(TokenStatus::as_str).collect();
    format!("in.({})", names.join(","))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRecord {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub clinic_id: Option<i64>,
    pub token_number: Option<i32>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub appointment_time: Option<NaiveTime>,
    pub status: TokenStatus,
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub patient: Option<Patient>,
    #[serde(default)]
    pub doctor: Option<DoctorRef>,
    #[serde(default)]
    pub clinic: Option<ClinicRef>,
}

impl TokenRecord {
    pub fn doctor_name(&self) -> &str {
        self.doctor.as_ref().map(|d| d.name.as_str()).unwrap_or_default()
    }

    pub fn clinic_name(&self) -> &str {
        self.clinic.as_ref().map(|c| c.name.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenView {
    pub id: i64,
    pub token_number: Option<i32>,
    pub patient: Option<PatientView>,
    pub doctor: String,
    pub doctor_id: i64,
    pub created_at: DateTime<Utc>,
    pub status: TokenStatus,
    pub clinic: Option<String>,
    pub clinic_id: Option<i64>,
    pub appointment_time: Option<NaiveTime>,
    pub date: NaiveDate,
}

impl From<&TokenRecord> for TokenView {
    fn from(token: &TokenRecord) -> Self {
        Self {
            id: token.id,
            token_number: token.token_number,
            patient: token.patient.as_ref().map(PatientView::from),
            doctor: format!("Dr. {}", token.doctor_name()),
            doctor_id: token.doctor_id,
            created_at: token.created_at,
            status: token.status,
            clinic: token.clinic.as_ref().map(|c| c.name.clone()),
            clinic_id: token.clinic_id,
            appointment_time: token.appointment_time,
            date: token.date,
        }
    }
}

/// What other patients may see of the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnonymizedToken {
    pub id: i64,
    pub token_number: Option<i32>,
    pub status: TokenStatus,
    pub appointment_time: Option<NaiveTime>,
}

impl From<&TokenRecord> for AnonymizedToken {
    fn from(token: &TokenRecord) -> Self {
        Self {
            id: token.id,
            token_number: token.token_number,
            status: token.status,
            appointment_time: token.appointment_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientCreateTokenRequest {
    #[serde(default, deserialize_with = "optional_number")]
    pub doctor_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub appointment_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffCreateTokenRequest {
    pub patient_name: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    pub patient_age: Option<i32>,
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    pub assigned_doctor: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmArrivalRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorWorkload {
    pub doctor_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusBreakdown {
    pub waiting: usize,
    pub confirmed: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicAnalytics {
    pub clinic_name: String,
    pub date: String,
    pub total_patients: usize,
    pub average_wait_time_minutes: f64,
    pub doctor_workload: Vec<DoctorWorkload>,
    pub patient_status_breakdown: StatusBreakdown,
}

pub fn confirmation_message(patient_name: &str, token: &TokenRecord) -> String {
    format!(
        "Dear {}, your token {} for Dr. {} at {} has been confirmed.",
        patient_name,
        token.token_number.unwrap_or_default(),
        token.doctor_name(),
        token.clinic_name()
    )
}
