use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Invalid date format. Use YYYY-MM-DD.")]
    InvalidDate,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::DoctorNotFound => AppError::NotFound(err.to_string()),
            ClinicError::InvalidDate => AppError::BadRequest(err.to_string()),
            ClinicError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
