use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{Role, User};

use crate::models::{Doctor, Receptionist, DOCTOR_SELECT, RECEPTIONIST_SELECT};
use crate::ClinicError;

/// Resolves the doctor or receptionist profile behind an account.
pub struct StaffService {
    supabase: SupabaseClient,
}

impl StaffService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn doctor_for_user(&self, user_id: Uuid) -> Result<Option<Doctor>, ClinicError> {
        let path = format!("/rest/v1/doctors?user_id=eq.{}&select={}", user_id, DOCTOR_SELECT);
        Ok(self.supabase.select_one(&path).await?)
    }

    pub async fn receptionist_for_user(&self, user_id: Uuid) -> Result<Option<Receptionist>, ClinicError> {
        let path = format!(
            "/rest/v1/receptionists?user_id=eq.{}&select={}",
            user_id, RECEPTIONIST_SELECT
        );
        Ok(self.supabase.select_one(&path).await?)
    }

    /// The clinic a doctor or receptionist works at. Patients and unassigned staff have none.
    pub async fn staff_clinic_id(&self, user: &User) -> Result<Option<i64>, ClinicError> {
        debug!("Resolving clinic for {} {}", user.role, user.id);

        let clinic_id = match user.role {
            Role::Doctor => self.doctor_for_user(user.id).await?.and_then(|d| d.clinic_id),
            Role::Receptionist => self.receptionist_for_user(user.id).await?.and_then(|r| r.clinic_id),
            Role::Patient => None,
        };

        Ok(clinic_id)
    }
}
