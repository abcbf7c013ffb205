use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Form,
};
use chrono::Utc;
use tracing::debug;

use clinic_cell::{AvailabilityService, ClinicService, Doctor};
use shared_config::AppConfig;

use crate::menus::{booking_type_menu, clinic_menu, doctor_menu, goodbye, invalid_choice, NO_DOCTORS};
use crate::models::{IvrForm, WELCOME_URL};
use crate::services::book_for_caller;
use crate::twiml::VoiceResponse;
use crate::IvrError;

async fn book(config: &AppConfig, doctor: &Doctor, form: &IvrForm) -> Result<VoiceResponse, IvrError> {
    let booking = book_for_caller(config, doctor, form.caller(), Utc::now().date_naive()).await?;
    Ok(goodbye(&booking.farewell(doctor)))
}

#[axum::debug_handler]
pub async fn welcome(State(config): State<Arc<AppConfig>>) -> Result<VoiceResponse, IvrError> {
    let clinics = ClinicService::new(&config).list_clinics().await?;
    Ok(clinic_menu(&clinics))
}

#[axum::debug_handler]
pub async fn select_clinic(
    State(config): State<Arc<AppConfig>>,
    Form(form): Form<IvrForm>,
) -> Result<VoiceResponse, IvrError> {
    let clinics = ClinicService::new(&config).list_clinics().await?;

    let Some(clinic) = form.choice().and_then(|n| clinics.get(n - 1)) else {
        debug!("Caller pressed {:?} at the clinic menu", form.digits);
        return Ok(invalid_choice().redirect(WELCOME_URL));
    };
    Ok(booking_type_menu(VoiceResponse::new(), clinic))
}

#[axum::debug_handler]
pub async fn handle_booking_type(
    State(config): State<Arc<AppConfig>>,
    Path(clinic_id): Path<i64>,
    Form(form): Form<IvrForm>,
) -> Result<VoiceResponse, IvrError> {
    let directory = ClinicService::new(&config);
    let Some(clinic) = directory.get_clinic(clinic_id).await? else {
        return Ok(goodbye("Clinic not found."));
    };

    match form.digits.as_deref().map(str::trim) {
        Some("1") => {
            let today = Utc::now().date_naive();
            match AvailabilityService::new(&config).least_loaded_doctor(clinic.id, today).await? {
                Some(doctor) => book(&config, &doctor, &form).await,
                None => Ok(goodbye(NO_DOCTORS)),
            }
        }
        Some("2") => {
            let doctors = directory.doctors_for_clinic(clinic.id).await?;
            Ok(doctor_menu(VoiceResponse::new(), clinic.id, &doctors))
        }
        _ => Ok(booking_type_menu(invalid_choice(), &clinic)),
    }
}

#[axum::debug_handler]
pub async fn handle_specific_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(clinic_id): Path<i64>,
    Form(form): Form<IvrForm>,
) -> Result<VoiceResponse, IvrError> {
    let doctors = ClinicService::new(&config).doctors_for_clinic(clinic_id).await?;

    match form.choice().and_then(|n| doctors.get(n - 1)) {
        Some(doctor) => book(&config, doctor, &form).await,
        None => Ok(doctor_menu(invalid_choice(), clinic_id, &doctors)),
    }
}
