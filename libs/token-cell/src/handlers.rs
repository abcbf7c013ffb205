use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use clinic_cell::{
    is_slot_start, parse_slot_time, AvailabilityService, ClinicError, ClinicService, StaffService,
};
use notification_cell::SmsService;
use patient_cell::{Patient, PatientService};
use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::extract::Json;

use crate::models::{
    confirmation_message, AnonymizedToken, ClinicAnalytics, ConfirmArrivalRequest, PatientCreateTokenRequest,
    StaffCreateTokenRequest, TokenRecord, TokenStatus, TokenView, UpdateStatusRequest,
};
use crate::services::{build_analytics, check_arrival, parse_staff_status, plan_transition, TokenService};
use crate::TokenError;

async fn patient_profile(config: &AppConfig, user: &User) -> Result<Option<Patient>, TokenError> {
    if user.role != Role::Patient {
        return Ok(None);
    }
    Ok(PatientService::new(config).patient_for_user(user.id).await?)
}

async fn send_confirmation(config: &AppConfig, patient: &Patient, token: &TokenRecord) {
    if let Some(phone) = patient.phone_number.as_deref() {
        SmsService::from_config(config)
            .notify(phone, &confirmation_message(&patient.name, token))
            .await;
    }
}

#[axum::debug_handler]
pub async fn patient_create_token(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<PatientCreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenView>), AppError> {
    let patient = patient_profile(&config, &user).await?.ok_or(TokenError::OnlyPatients)?;
    let doctor_id = request.doctor_id.ok_or(TokenError::DoctorRequired)?;

    let doctor = ClinicService::new(&config)
        .get_doctor(doctor_id)
        .await?
        .ok_or(TokenError::DoctorNotFound)?;

    let now = Utc::now();
    let today = now.date_naive();
    let date = request.date.unwrap_or(today);
    if date < today {
        return Err(TokenError::PastDate.into());
    }

    let tokens = TokenService::new(&config);
    if tokens.has_active_token(patient.id, date).await? {
        return Err(TokenError::AlreadyActive.into());
    }

    let appointment_time = match request.appointment_time.as_deref() {
        Some(raw) => {
            let slot = parse_slot_time(raw)
                .filter(|t| is_slot_start(*t))
                .ok_or(TokenError::InvalidSlot)?;
            let free = AvailabilityService::new(&config)
                .available_slots(doctor.id, date, today, now.time())
                .await?;
            if !free.contains(&slot) {
                return Err(TokenError::SlotUnavailable.into());
            }
            Some(slot)
        }
        None => None,
    };

    let token = tokens.issue_token(&patient, &doctor, date, appointment_time).await?;
    send_confirmation(&config, &patient, &token).await;

    Ok((StatusCode::CREATED, Json(TokenView::from(&token))))
}

#[axum::debug_handler]
pub async fn get_my_token(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<TokenView>, AppError> {
    let patient = patient_profile(&config, &user).await?.ok_or(TokenError::NoPatientProfile)?;

    let token = TokenService::new(&config)
        .latest_for_patient(patient.id, Utc::now().date_naive(), &TokenStatus::ACTIVE)
        .await?
        .ok_or(TokenError::NoActiveToken)?;

    Ok(Json(TokenView::from(&token)))
}

#[axum::debug_handler]
pub async fn confirm_arrival(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ConfirmArrivalRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) else {
        return Err(TokenError::LocationRequired.into());
    };
    let patient = patient_profile(&config, &user).await?.ok_or(TokenError::NoPatientProfile)?;

    let tokens = TokenService::new(&config);
    let token = tokens
        .latest_for_patient(patient.id, Utc::now().date_naive(), &[TokenStatus::Waiting])
        .await?
        .ok_or(TokenError::NoTokenToConfirm)?;

    let clinic = match token.clinic_id {
        Some(clinic_id) => ClinicService::new(&config).get_clinic(clinic_id).await?,
        None => None,
    };
    let clinic_location = clinic
        .and_then(|c| c.coordinates())
        .ok_or(TokenError::ClinicLocationMissing)?;

    let distance_km = check_arrival((latitude, longitude), clinic_location, config.arrival_radius_km)?;
    let updated = tokens.confirm_arrival(token.id, distance_km).await?;

    Ok(Json(json!({
        "message": "Arrival confirmed successfully.",
        "token": TokenView::from(&updated),
    })))
}

#[axum::debug_handler]
pub async fn patient_cancel_token(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient = patient_profile(&config, &user).await?.ok_or(TokenError::NoPatientProfile)?;

    let tokens = TokenService::new(&config);
    let token = tokens
        .latest_for_patient(
            patient.id,
            Utc::now().date_naive(),
            &[TokenStatus::Waiting, TokenStatus::Confirmed],
        )
        .await?
        .ok_or(TokenError::NothingToCancel)?;

    let change = plan_transition(token.status, TokenStatus::Cancelled, Utc::now())?;
    tokens.apply_status(token.id, &change).await?;

    Ok(Json(json!({ "message": "Your token has been successfully cancelled." })))
}

#[axum::debug_handler]
pub async fn live_queue(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Vec<AnonymizedToken>>, AppError> {
    let queue = TokenService::new(&config)
        .live_queue(doctor_id, Utc::now().date_naive())
        .await?;

    Ok(Json(queue.iter().map(AnonymizedToken::from).collect()))
}

/// Reception desk view: today's waiting and confirmed tokens of the caller's clinic.
#[axum::debug_handler]
pub async fn list_clinic_tokens(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<TokenView>>, AppError> {
    let Some(clinic_id) = StaffService::new(&config).staff_clinic_id(&user).await? else {
        return Ok(Json(Vec::new()));
    };

    let tokens = TokenService::new(&config)
        .clinic_queue(clinic_id, Utc::now().date_naive())
        .await?;

    Ok(Json(tokens.iter().map(TokenView::from).collect()))
}

#[axum::debug_handler]
pub async fn staff_create_token(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<StaffCreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenView>), AppError> {
    if !user.is_staff() {
        return Err(TokenError::StaffOnly.into());
    }

    let (Some(name), Some(age), Some(phone), Some(doctor_id)) = (
        request.patient_name.filter(|n| !n.trim().is_empty()),
        request.patient_age,
        request.phone_number.filter(|p| !p.trim().is_empty()),
        request.assigned_doctor,
    ) else {
        return Err(TokenError::MissingFields.into());
    };

    let clinic_id = StaffService::new(&config)
        .staff_clinic_id(&user)
        .await?
        .ok_or(TokenError::NoClinic)?;

    let doctor = ClinicService::new(&config)
        .get_doctor(doctor_id)
        .await?
        .filter(|d| d.clinic_id == Some(clinic_id))
        .ok_or(ClinicError::DoctorNotFound)?;

    debug!("Walk-in token for {} with doctor {}", phone, doctor.id);
    let patient = PatientService::new(&config)
        .get_or_create_by_phone(phone.trim(), name.trim(), age)
        .await?;

    let token = TokenService::new(&config)
        .issue_token(&patient, &doctor, Utc::now().date_naive(), None)
        .await?;
    send_confirmation(&config, &patient, &token).await;

    Ok((StatusCode::CREATED, Json(TokenView::from(&token))))
}

#[axum::debug_handler]
pub async fn update_token_status(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(token_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<TokenView>, AppError> {
    let clinic_id = StaffService::new(&config)
        .staff_clinic_id(&user)
        .await?
        .ok_or(TokenError::TokenNotFound)?;

    let today = Utc::now().date_naive();
    let tokens = TokenService::new(&config);
    let token = tokens
        .get_token(token_id)
        .await?
        .filter(|t| t.clinic_id == Some(clinic_id) && t.date == today)
        .ok_or(TokenError::TokenNotFound)?;

    let target = parse_staff_status(request.status.as_deref())?;
    let change = plan_transition(token.status, target, Utc::now())?;
    let updated = tokens.apply_status(token.id, &change).await?;

    Ok(Json(TokenView::from(&updated)))
}

#[axum::debug_handler]
pub async fn clinic_analytics(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<ClinicAnalytics>, AppError> {
    let clinic_id = StaffService::new(&config)
        .staff_clinic_id(&user)
        .await?
        .ok_or(TokenError::NoClinic)?;

    let clinics = ClinicService::new(&config);
    let clinic = clinics.get_clinic(clinic_id).await?.ok_or(TokenError::NoClinic)?;

    let today = Utc::now().date_naive();
    let stats = clinics.token_stats(Some(clinic_id), today).await?;
    let doctors = clinics.doctors_for_clinic(clinic_id).await?;

    Ok(Json(build_analytics(&clinic.name, today, &stats, &doctors)))
}
