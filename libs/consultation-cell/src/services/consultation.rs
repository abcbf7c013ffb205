use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Consultation, PrescriptionItem, PrescriptionItemInput, CONSULTATION_SELECT};
use crate::ConsultationError;

pub struct ConsultationService {
    supabase: SupabaseClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Saves the consultation and its prescription in two writes. If the items cannot be
    /// stored the consultation row is removed again.
    pub async fn create_consultation(
        &self,
        doctor_id: i64,
        patient_id: i64,
        notes: &str,
        items: &[PrescriptionItemInput],
        now: DateTime<Utc>,
    ) -> Result<Consultation, ConsultationError> {
        debug!("Recording consultation of doctor {} with patient {}", doctor_id, patient_id);

        let body = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": now,
            "notes": notes,
        });
        let mut rows: Vec<Consultation> = self
            .supabase
            .insert(&format!("consultations?select={}", CONSULTATION_SELECT), body)
            .await?;
        let mut consultation = rows.pop().ok_or(ConsultationError::NotSaved)?;

        if !items.is_empty() {
            match self.insert_items(consultation.id, items).await {
                Ok(saved) => consultation.prescription_items = saved,
                Err(e) => {
                    error!("Prescription for consultation {} failed, rolling back: {}", consultation.id, e);
                    let path = format!("/rest/v1/consultations?id=eq.{}", consultation.id);
                    if let Err(cleanup) = self.supabase.delete(&path).await {
                        error!("Could not remove consultation {}: {}", consultation.id, cleanup);
                    }
                    return Err(e);
                }
            }
        }

        info!("Consultation {} recorded with {} prescription items", consultation.id, items.len());
        Ok(consultation)
    }

    async fn insert_items(
        &self,
        consultation_id: i64,
        items: &[PrescriptionItemInput],
    ) -> Result<Vec<PrescriptionItem>, ConsultationError> {
        let rows: Vec<Value> = items
            .iter()
            .map(|item| {
                json!({
                    "consultation_id": consultation_id,
                    "medicine_name": item.medicine_name.trim(),
                    "dosage": item.dosage,
                    "duration_days": item.duration_days,
                    "timing_morning": item.timing_morning,
                    "timing_afternoon": item.timing_afternoon,
                    "timing_evening": item.timing_evening,
                })
            })
            .collect();

        Ok(self.supabase.insert("prescription_items", Value::Array(rows)).await?)
    }

    /// Newest first.
    pub async fn history_for_patient(&self, patient_id: i64) -> Result<Vec<Consultation>, ConsultationError> {
        let path = format!(
            "/rest/v1/consultations?patient_id=eq.{}&select={}&order=date.desc",
            patient_id, CONSULTATION_SELECT
        );
        Ok(self.supabase.select(&path).await?)
    }
}
