use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use clinic_cell::Doctor;
use patient_cell::Patient;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{status_filter, TokenRecord, TokenStatus, TOKEN_SELECT};
use crate::services::workflow::{plan_transition, StatusChange};
use crate::TokenError;

const MAX_NUMBERING_ATTEMPTS: u32 = 5;

#[derive(Debug, Deserialize)]
struct NumberRow {
    token_number: Option<i32>,
}

/// Next number in a clinic's day sequence.
pub fn next_token_number(highest: Option<i32>) -> i32 {
    highest.map(|n| n + 1).unwrap_or(1)
}

pub struct TokenService {
    supabase: SupabaseClient,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_token(&self, token_id: i64) -> Result<Option<TokenRecord>, TokenError> {
        let path = format!("/rest/v1/tokens?id=eq.{}&select={}", token_id, TOKEN_SELECT);
        Ok(self.supabase.select_one(&path).await?)
    }

    /// Most recently created token of the patient on `date` whose status is one of `statuses`.
    pub async fn latest_for_patient(
        &self,
        patient_id: i64,
        date: NaiveDate,
        statuses: &[TokenStatus],
    ) -> Result<Option<TokenRecord>, TokenError> {
        let path = format!(
            "/rest/v1/tokens?patient_id=eq.{}&date=eq.{}&status={}&select={}&order=created_at.desc&limit=1",
            patient_id,
            date,
            status_filter(statuses),
            TOKEN_SELECT
        );
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn has_active_token(&self, patient_id: i64, date: NaiveDate) -> Result<bool, TokenError> {
        Ok(self
            .latest_for_patient(patient_id, date, &TokenStatus::ACTIVE)
            .await?
            .is_some())
    }

    pub async fn highest_token_number(&self, clinic_id: i64, date: NaiveDate) -> Result<Option<i32>, TokenError> {
        let path = format!(
            "/rest/v1/tokens?select=token_number&clinic_id=eq.{}&date=eq.{}&token_number=not.is.null&order=token_number.desc&limit=1",
            clinic_id, date
        );
        let row: Option<NumberRow> = self.supabase.select_one(&path).await?;
        Ok(row.and_then(|r| r.token_number))
    }

    /// Insert a token with the next free number of the doctor's clinic for that day.
    /// A concurrent insert that took the same number trips the unique constraint; the
    /// number is then recomputed.
    pub async fn issue_token(
        &self,
        patient: &Patient,
        doctor: &Doctor,
        date: NaiveDate,
        appointment_time: Option<NaiveTime>,
    ) -> Result<TokenRecord, TokenError> {
        let clinic_id = doctor.clinic_id.ok_or(TokenError::DoctorWithoutClinic)?;

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            let token_number = next_token_number(self.highest_token_number(clinic_id, date).await?);
            debug!("Issuing token {} for clinic {} on {} (attempt {})", token_number, clinic_id, date, attempt);

            let body = json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "clinic_id": clinic_id,
                "token_number": token_number,
                "date": date,
                "appointment_time": appointment_time,
                "status": TokenStatus::Waiting,
            });

            match self
                .supabase
                .insert::<TokenRecord>(&format!("tokens?select={}", TOKEN_SELECT), body)
                .await
            {
                Ok(mut rows) => {
                    let token = rows.pop().ok_or(TokenError::NotSaved)?;
                    info!("Token {} issued to patient {} for doctor {}", token_number, patient.id, doctor.id);
                    return Ok(token);
                }
                Err(e) if e.is_conflict() => {
                    warn!("Token number {} for clinic {} already taken, retrying", token_number, clinic_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TokenError::NumberingContention)
    }

    /// Today's queue of one doctor as shown to patients.
    pub async fn live_queue(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<TokenRecord>, TokenError> {
        let path = format!(
            "/rest/v1/tokens?doctor_id=eq.{}&date=eq.{}&status={}&select=*&order=token_number.asc",
            doctor_id,
            date,
            status_filter(&TokenStatus::IN_QUEUE)
        );
        Ok(self.supabase.select(&path).await?)
    }

    /// Waiting and confirmed tokens of a clinic, oldest first.
    pub async fn clinic_queue(&self, clinic_id: i64, date: NaiveDate) -> Result<Vec<TokenRecord>, TokenError> {
        let path = format!(
            "/rest/v1/tokens?clinic_id=eq.{}&date=eq.{}&status={}&select={}&order=created_at.asc",
            clinic_id,
            date,
            status_filter(&[TokenStatus::Waiting, TokenStatus::Confirmed]),
            TOKEN_SELECT
        );
        Ok(self.supabase.select(&path).await?)
    }

    pub async fn apply_status(&self, token_id: i64, change: &StatusChange) -> Result<TokenRecord, TokenError> {
        let path = format!("/rest/v1/tokens?id=eq.{}&select={}", token_id, TOKEN_SELECT);
        let mut rows: Vec<TokenRecord> = self.supabase.update(&path, change.to_patch()).await?;
        let token = rows.pop().ok_or(TokenError::TokenNotFound)?;

        info!("Token {} moved to {}", token_id, change.status);
        Ok(token)
    }

    pub async fn confirm_arrival(&self, token_id: i64, distance_km: f64) -> Result<TokenRecord, TokenError> {
        let path = format!("/rest/v1/tokens?id=eq.{}&select={}", token_id, TOKEN_SELECT);
        let body = json!({
            "status": TokenStatus::Confirmed,
            "distance_km": distance_km,
        });

        let mut rows: Vec<TokenRecord> = self.supabase.update(&path, body).await?;
        let token = rows.pop().ok_or(TokenError::TokenNotFound)?;

        info!("Arrival confirmed for token {} at {:.2} km", token_id, distance_km);
        Ok(token)
    }

    /// Marks the patient's current queue token as seen, if they have one.
    pub async fn complete_active_token(
        &self,
        patient_id: i64,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<TokenRecord>, TokenError> {
        let Some(token) = self.latest_for_patient(patient_id, date, &TokenStatus::IN_QUEUE).await? else {
            debug!("Patient {} has no queue token on {}", patient_id, date);
            return Ok(None);
        };

        let change = plan_transition(token.status, TokenStatus::Completed, now)?;
        self.apply_status(token.id, &change).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_starts_at_one() {
        assert_eq!(next_token_number(None), 1);
        assert_eq!(next_token_number(Some(41)), 42);
    }
}
