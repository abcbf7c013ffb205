use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{NewPatient, Patient, PATIENT_SELECT};
use crate::PatientError;

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Option<Patient>, PatientError> {
        debug!("Fetching patient {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&select={}", patient_id, PATIENT_SELECT);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn patient_for_user(&self, user_id: Uuid) -> Result<Option<Patient>, PatientError> {
        debug!("Fetching patient profile for user {}", user_id);

        let path = format!("/rest/v1/patients?user_id=eq.{}&select={}", user_id, PATIENT_SELECT);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Patient>, PatientError> {
        let path = format!(
            "/rest/v1/patients?phone_number=eq.{}&select={}",
            urlencoding::encode(phone_number),
            PATIENT_SELECT
        );
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn create_patient(&self, patient: NewPatient) -> Result<Patient, PatientError> {
        debug!("Creating patient {}", patient.name);

        let body = json!({
            "name": patient.name,
            "age": patient.age,
            "phone_number": patient.phone_number,
            "user_id": patient.user_id,
            "is_phone_verified": false,
        });

        let mut rows: Vec<Patient> = self.supabase.insert("patients", body).await?;
        let created = rows.pop().ok_or(PatientError::NotSaved)?;

        info!("Patient {} created", created.id);
        Ok(created)
    }

    /// Existing record wins: name and age are only used when the number is new.
    pub async fn get_or_create_by_phone(
        &self,
        phone_number: &str,
        name: &str,
        age: i32,
    ) -> Result<Patient, PatientError> {
        if let Some(existing) = self.find_by_phone(phone_number).await? {
            return Ok(existing);
        }

        let new_patient = NewPatient {
            name: name.to_string(),
            age,
            phone_number: Some(phone_number.to_string()),
            user_id: None,
        };

        match self.create_patient(new_patient).await {
            Ok(created) => Ok(created),
            Err(PatientError::Database(e)) if e.is_conflict() => {
                warn!("Patient with phone {} created concurrently, reloading", phone_number);
                self.find_by_phone(phone_number).await?.ok_or(PatientError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Attach a walk-in record to a newly registered account.
    pub async fn claim_walk_in(
        &self,
        patient_id: i64,
        user_id: Uuid,
        name: &str,
        age: i32,
    ) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}&user_id=is.null", patient_id);
        let body = json!({
            "user_id": user_id,
            "name": name,
            "age": age,
        });

        let mut rows: Vec<Patient> = self.supabase.update(&path, body).await?;
        let claimed = rows.pop().ok_or(PatientError::NotFound)?;

        info!("Walk-in patient {} linked to user {}", claimed.id, user_id);
        Ok(claimed)
    }

    pub async fn set_otp(
        &self,
        patient_id: i64,
        otp: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let _: Vec<Patient> = self
            .supabase
            .update(&path, json!({ "otp": otp, "otp_expiry": expires_at }))
            .await?;
        Ok(())
    }

    pub async fn mark_phone_verified(&self, patient_id: i64) -> Result<(), PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let body = json!({
            "is_phone_verified": true,
            "otp": null,
            "otp_expiry": null,
        });

        let _: Vec<Patient> = self.supabase.update(&path, body).await?;
        info!("Phone verified for patient {}", patient_id);
        Ok(())
    }
}
