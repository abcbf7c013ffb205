use chrono::NaiveDate;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Clinic, ClinicView, ClinicWithDoctors, Doctor, DoctorView, TokenStat, DOCTOR_SELECT};
use crate::ClinicError;

pub struct ClinicService {
    supabase: SupabaseClient,
}

impl ClinicService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_clinics(&self) -> Result<Vec<Clinic>, ClinicError> {
        debug!("Listing clinics");
        Ok(self.supabase.select("/rest/v1/clinics?select=*&order=id.asc").await?)
    }

    pub async fn get_clinic(&self, clinic_id: i64) -> Result<Option<Clinic>, ClinicError> {
        let path = format!("/rest/v1/clinics?id=eq.{}&select=*", clinic_id);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Option<Doctor>, ClinicError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select={}", doctor_id, DOCTOR_SELECT);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn doctors_for_clinic(&self, clinic_id: i64) -> Result<Vec<Doctor>, ClinicError> {
        debug!("Listing doctors of clinic {}", clinic_id);
        let path = format!(
            "/rest/v1/doctors?clinic_id=eq.{}&select={}&order=id.asc",
            clinic_id, DOCTOR_SELECT
        );
        Ok(self.supabase.select(&path).await?)
    }

    /// Token rows of one day, optionally narrowed to a clinic.
    pub async fn token_stats(&self, clinic_id: Option<i64>, date: NaiveDate) -> Result<Vec<TokenStat>, ClinicError> {
        let mut path = format!(
            "/rest/v1/tokens?select=clinic_id,doctor_id,status,created_at,completed_at&date=eq.{}",
            date
        );
        if let Some(clinic_id) = clinic_id {
            path.push_str(&format!("&clinic_id=eq.{}", clinic_id));
        }
        Ok(self.supabase.select(&path).await?)
    }

    pub async fn clinics_with_doctors(&self, today: NaiveDate) -> Result<Vec<ClinicWithDoctors>, ClinicError> {
        let clinics = self.list_clinics().await?;
        let doctors: Vec<Doctor> = self
            .supabase
            .select(&format!("/rest/v1/doctors?select={}&order=id.asc", DOCTOR_SELECT))
            .await?;
        let stats = self.token_stats(None, today).await?;

        Ok(assemble_clinics(&clinics, &doctors, &stats))
    }
}

/// Mean of (completed_at - created_at) in minutes over completed tokens that carry a completion time.
pub fn average_wait_minutes<'a>(stats: impl IntoIterator<Item = &'a TokenStat>) -> Option<f64> {
    let waits: Vec<f64> = stats
        .into_iter()
        .filter(|stat| stat.status == "completed")
        .filter_map(|stat| stat.completed_at.map(|done| (done - stat.created_at).num_seconds() as f64 / 60.0))
        .collect();

    if waits.is_empty() {
        return None;
    }
    Some(waits.iter().sum::<f64>() / waits.len() as f64)
}

pub fn assemble_clinics(clinics: &[Clinic], doctors: &[Doctor], stats: &[TokenStat]) -> Vec<ClinicWithDoctors> {
    clinics
        .iter()
        .map(|clinic| {
            let clinic_stats: Vec<&TokenStat> = stats
                .iter()
                .filter(|stat| stat.clinic_id == Some(clinic.id))
                .collect();

            ClinicWithDoctors {
                clinic: ClinicView::from(clinic),
                doctors: doctors
                    .iter()
                    .filter(|doctor| doctor.clinic_id == Some(clinic.id))
                    .map(DoctorView::from)
                    .collect(),
                average_wait_time: average_wait_minutes(clinic_stats.iter().copied())
                    .map(|minutes| minutes.round() as i64)
                    .unwrap_or(0),
                total_tokens: clinic_stats.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn stat(clinic_id: i64, status: &str, wait_minutes: Option<i64>) -> TokenStat {
        let created_at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        TokenStat {
            clinic_id: Some(clinic_id),
            doctor_id: 3,
            status: status.to_string(),
            created_at,
            completed_at: wait_minutes.map(|m| created_at + Duration::minutes(m)),
        }
    }

    fn clinic(id: i64, name: &str) -> Clinic {
        Clinic {
            id,
            name: name.to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn average_wait_ignores_unfinished_tokens() {
        let stats = vec![
            stat(1, "completed", Some(10)),
            stat(1, "completed", Some(25)),
            stat(1, "completed", None),
            stat(1, "waiting", None),
        ];
        assert_eq!(average_wait_minutes(&stats), Some(17.5));
        assert_eq!(average_wait_minutes(&stats[3..]), None);
    }

    #[test]
    fn clinics_carry_their_own_doctors_and_counts() {
        let clinics = vec![clinic(1, "City Clinic"), clinic(2, "Lake Clinic")];
        let doctors = vec![Doctor {
            id: 3,
            user_id: None,
            name: "Mehta".to_string(),
            specialization: "General Medicine".to_string(),
            clinic_id: Some(1),
            role: "doctor".to_string(),
            user: None,
        }];
        let stats = vec![stat(1, "completed", Some(10)), stat(1, "completed", Some(15)), stat(2, "waiting", None)];

        let result = assemble_clinics(&clinics, &doctors, &stats);

        assert_eq!(result[0].doctors.len(), 1);
        assert_eq!(result[0].total_tokens, 2);
        assert_eq!(result[0].average_wait_time, 13);
        assert!(result[1].doctors.is_empty());
        assert_eq!(result[1].total_tokens, 1);
        assert_eq!(result[1].average_wait_time, 0);

        let json = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(json["name"], result[0].clinic.name.as_str());
        assert_eq!(json["city"], "Pune");
        assert!(json.get("latitude").is_none());
        assert!(json.get("clinic").is_none());
    }
}
