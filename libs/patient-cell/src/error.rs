use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found.")]
    NotFound,

    #[error("Patient record could not be saved")]
    NotSaved,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::NotSaved => AppError::Internal(err.to_string()),
            PatientError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
