use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_cell::{Doctor, DoctorView};
use shared_models::extract::optional_number;

pub const CONSULTATION_SELECT: &str =
    "*,doctor:doctors(*,user:app_users(id,username)),prescription_items(*)";

pub const MAX_DURATION_DAYS: i32 = 365;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionItemInput {
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub duration_days: i32,
    #[serde(default)]
    pub timing_morning: bool,
    #[serde(default)]
    pub timing_afternoon: bool,
    #[serde(default)]
    pub timing_evening: bool,
}

impl PrescriptionItemInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.medicine_name.trim().is_empty() {
            return Err("Medicine name is required.".to_string());
        }
        if !(0..=MAX_DURATION_DAYS).contains(&self.duration_days) {
            return Err(format!(
                "Duration for {} must be between 0 and {} days.",
                self.medicine_name, MAX_DURATION_DAYS
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateConsultationRequest {
    #[serde(default, deserialize_with = "optional_number")]
    pub patient: Option<i64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub prescription_items: Vec<PrescriptionItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionItem {
    pub id: i64,
    pub medicine_name: String,
    pub dosage: String,
    pub duration_days: i32,
    pub timing_morning: bool,
    pub timing_afternoon: bool,
    pub timing_evening: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: DateTime<Utc>,
    pub notes: String,
    #[serde(default)]
    pub doctor: Option<Doctor>,
    #[serde(default)]
    pub prescription_items: Vec<PrescriptionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationView {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub doctor: Option<DoctorView>,
    pub prescription_items: Vec<PrescriptionItem>,
}

impl From<&Consultation> for ConsultationView {
    fn from(consultation: &Consultation) -> Self {
        Self {
            id: consultation.id,
            date: consultation.date,
            notes: consultation.notes.clone(),
            doctor: consultation.doctor.as_ref().map(DoctorView::from),
            prescription_items: consultation.prescription_items.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseTiming {
    Morning,
    Afternoon,
    Evening,
}

impl DoseTiming {
    pub fn label(&self) -> &'static str {
        match self {
            DoseTiming::Morning => "morning",
            DoseTiming::Afternoon => "afternoon",
            DoseTiming::Evening => "evening",
        }
    }

    pub fn hour(&self) -> u32 {
        match self {
            DoseTiming::Morning => 8,
            DoseTiming::Afternoon => 13,
            DoseTiming::Evening => 20,
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour(), 0, 0)
    }
}
