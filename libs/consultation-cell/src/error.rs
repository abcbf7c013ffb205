use thiserror::Error;

use clinic_cell::ClinicError;
use patient_cell::PatientError;
use shared_database::DatabaseError;
use shared_models::error::AppError;
use token_cell::TokenError;

#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Logged-in user is not a doctor.")]
    NotDoctor,

    #[error("Patient and notes are required.")]
    MissingFields,

    #[error("{0}")]
    InvalidItem(String),

    #[error("Patient not found.")]
    PatientNotFound,

    #[error("You do not have permission to view this history.")]
    HistoryForbidden,

    #[error("Consultation could not be saved")]
    NotSaved,

    #[error(transparent)]
    Clinic(#[from] ClinicError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::NotDoctor | ConsultationError::HistoryForbidden => AppError::Forbidden(err.to_string()),
            ConsultationError::MissingFields => AppError::BadRequest(err.to_string()),
            ConsultationError::InvalidItem(msg) => AppError::ValidationError(msg),
            ConsultationError::PatientNotFound => AppError::NotFound(err.to_string()),
            ConsultationError::NotSaved => AppError::Internal(err.to_string()),
            ConsultationError::Clinic(e) => e.into(),
            ConsultationError::Patient(e) => e.into(),
            ConsultationError::Token(e) => e.into(),
            ConsultationError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
