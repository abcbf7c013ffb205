use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::{info, warn};

use clinic_cell::StaffService;
use notification_cell::{ReminderJob, ReminderQueueService};
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::extract::Json;
use token_cell::TokenService;

use crate::models::{ConsultationView, CreateConsultationRequest};
use crate::services::{plan_prescription_reminders, ConsultationService};
use crate::ConsultationError;

async fn enqueue_reminders(config: &AppConfig, jobs: &[ReminderJob]) {
    let queue = match ReminderQueueService::new(config) {
        Ok(queue) => queue,
        Err(e) => {
            warn!("Reminder queue unavailable, {} reminders dropped: {}", jobs.len(), e);
            return;
        }
    };

    match queue.enqueue_all(jobs).await {
        Ok(count) => info!("Scheduled {} prescription reminders", count),
        Err(e) => warn!("Failed to schedule prescription reminders: {}", e),
    }
}

#[axum::debug_handler]
pub async fn create_consultation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateConsultationRequest>,
) -> Result<(StatusCode, Json<ConsultationView>), AppError> {
    if user.role != Role::Doctor {
        return Err(ConsultationError::NotDoctor.into());
    }
    let doctor = StaffService::new(&config)
        .doctor_for_user(user.id)
        .await?
        .ok_or(ConsultationError::NotDoctor)?;

    let (Some(patient_id), Some(notes)) = (request.patient, request.notes.filter(|n| !n.trim().is_empty())) else {
        return Err(ConsultationError::MissingFields.into());
    };
    for item in &request.prescription_items {
        item.validate().map_err(ConsultationError::InvalidItem)?;
    }

    let patient = PatientService::new(&config)
        .get_patient(patient_id)
        .await?
        .ok_or(ConsultationError::PatientNotFound)?;

    let now = Utc::now();
    let consultation = ConsultationService::new(&config)
        .create_consultation(doctor.id, patient.id, &notes, &request.prescription_items, now)
        .await?;

    if let Err(e) = TokenService::new(&config)
        .complete_active_token(patient.id, now.date_naive(), now)
        .await
    {
        warn!("Could not complete queue token of patient {}: {}", patient.id, e);
    }

    if let Some(phone) = patient.phone_number.as_deref() {
        let jobs = plan_prescription_reminders(
            &patient.name,
            phone,
            &consultation.prescription_items,
            now.date_naive(),
        );
        if !jobs.is_empty() {
            enqueue_reminders(&config, &jobs).await;
        }
    }

    Ok((StatusCode::CREATED, Json(ConsultationView::from(&consultation))))
}

#[axum::debug_handler]
pub async fn my_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ConsultationView>>, AppError> {
    if user.role != Role::Patient {
        return Ok(Json(Vec::new()));
    }
    let Some(patient) = PatientService::new(&config).patient_for_user(user.id).await? else {
        return Ok(Json(Vec::new()));
    };

    let history = ConsultationService::new(&config).history_for_patient(patient.id).await?;
    Ok(Json(history.iter().map(ConsultationView::from).collect()))
}

/// Staff may read any patient's history; patients only their own.
#[axum::debug_handler]
pub async fn patient_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<ConsultationView>>, AppError> {
    if !user.is_staff() {
        let own = PatientService::new(&config).patient_for_user(user.id).await?;
        if own.map(|p| p.id) != Some(patient_id) {
            return Err(ConsultationError::HistoryForbidden.into());
        }
    }

    let history = ConsultationService::new(&config).history_for_patient(patient_id).await?;
    Ok(Json(history.iter().map(ConsultationView::from).collect()))
}
