use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailableSlots, ClinicWithDoctors, DoctorView};
use crate::services::{format_slot, AvailabilityService, ClinicService, StaffService, SLOT_MINUTES};
use crate::ClinicError;

#[axum::debug_handler]
pub async fn public_clinics(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<ClinicWithDoctors>>, AppError> {
    let service = ClinicService::new(&config);
    let clinics = service.clinics_with_doctors(Utc::now().date_naive()).await?;
    Ok(Json(clinics))
}

#[axum::debug_handler]
pub async fn clinics_with_doctors(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Vec<ClinicWithDoctors>>, AppError> {
    let service = ClinicService::new(&config);
    let clinics = service.clinics_with_doctors(Utc::now().date_naive()).await?;
    Ok(Json(clinics))
}

/// Doctors of the caller's clinic.
#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<DoctorView>>, AppError> {
    let staff = StaffService::new(&config);
    let Some(clinic_id) = staff.staff_clinic_id(&user).await? else {
        return Ok(Json(Vec::new()));
    };

    let doctors = ClinicService::new(&config).doctors_for_clinic(clinic_id).await?;
    Ok(Json(doctors.iter().map(DoctorView::from).collect()))
}

#[axum::debug_handler]
pub async fn available_slots(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path((doctor_id, date)): Path<(i64, String)>,
) -> Result<Json<AvailableSlots>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| ClinicError::InvalidDate)?;
    let now = Utc::now();

    let slots = AvailabilityService::new(&config)
        .available_slots(doctor_id, date, now.date_naive(), now.time())
        .await?;

    Ok(Json(AvailableSlots {
        doctor_id,
        date,
        slot_minutes: SLOT_MINUTES,
        available_slots: slots.into_iter().map(format_slot).collect(),
    }))
}
