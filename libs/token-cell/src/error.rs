use thiserror::Error;

use clinic_cell::ClinicError;
use patient_cell::PatientError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

use crate::models::TokenStatus;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Only patients can create tokens.")]
    OnlyPatients,

    #[error("Only clinic staff can create walk-in tokens.")]
    StaffOnly,

    #[error("No patient profile found.")]
    NoPatientProfile,

    #[error("User is not associated with a clinic.")]
    NoClinic,

    #[error("Doctor ID is required.")]
    DoctorRequired,

    #[error("Doctor not found.")]
    DoctorNotFound,

    #[error("Doctor is not assigned to a clinic.")]
    DoctorWithoutClinic,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Cannot book a token for a past date.")]
    PastDate,

    #[error("You already have an active token for today.")]
    AlreadyActive,

    #[error("Invalid appointment time. Choose a 15 minute slot between 09:00 and 16:45.")]
    InvalidSlot,

    #[error("This time slot is no longer available.")]
    SlotUnavailable,

    #[error("No active token found for today.")]
    NoActiveToken,

    #[error("Latitude and longitude are required.")]
    LocationRequired,

    #[error("No active token found to confirm.")]
    NoTokenToConfirm,

    #[error("Clinic location not configured.")]
    ClinicLocationMissing,

    #[error("You are approximately {distance_km:.2} km away. You must be within {radius_km:.1} km of the clinic to confirm.")]
    TooFar { distance_km: f64, radius_km: f64 },

    #[error("You do not have an active token to cancel.")]
    NothingToCancel,

    #[error("Not found.")]
    TokenNotFound,

    #[error("Invalid or not allowed status update.")]
    InvalidStatus,

    #[error("Cannot change token status from {from} to {to}.")]
    InvalidTransition { from: TokenStatus, to: TokenStatus },

    #[error("Could not allocate a token number, please retry.")]
    NumberingContention,

    #[error("Token could not be saved")]
    NotSaved,

    #[error(transparent)]
    Clinic(#[from] ClinicError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::OnlyPatients | TokenError::StaffOnly | TokenError::NoClinic => {
                AppError::Forbidden(err.to_string())
            }
            TokenError::DoctorNotFound
            | TokenError::NoActiveToken
            | TokenError::NoTokenToConfirm
            | TokenError::NothingToCancel
            | TokenError::TokenNotFound => AppError::NotFound(err.to_string()),
            TokenError::SlotUnavailable | TokenError::NumberingContention => AppError::Conflict(err.to_string()),
            TokenError::ClinicLocationMissing | TokenError::NotSaved => AppError::Internal(err.to_string()),
            TokenError::Clinic(e) => e.into(),
            TokenError::Patient(e) => e.into(),
            TokenError::Database(e) => AppError::Database(e.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
