use thiserror::Error;

use clinic_cell::ClinicError;
use patient_cell::PatientError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("This username is already taken.")]
    UsernameTaken,

    #[error("Phone number must start with '+' and include country code.")]
    InvalidPhone,

    #[error("This phone number is already registered.")]
    PhoneTaken,

    #[error("Password fields didn't match.")]
    PasswordMismatch,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Staff access only.")]
    StaffOnly,

    #[error("Patient with this phone number not found.")]
    PhoneNotFound,

    #[error("Phone number is already verified.")]
    AlreadyVerified,

    #[error("Invalid OTP.")]
    InvalidOtp,

    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Could not issue token: {0}")]
    TokenIssue(String),

    #[error("User could not be saved")]
    NotSaved,

    #[error(transparent)]
    Clinic(#[from] ClinicError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields
            | AuthError::UsernameTaken
            | AuthError::InvalidPhone
            | AuthError::PhoneTaken
            | AuthError::PasswordMismatch
            | AuthError::InvalidCredentials
            | AuthError::AlreadyVerified
            | AuthError::InvalidOtp
            | AuthError::OtpExpired => AppError::BadRequest(err.to_string()),
            AuthError::WeakPassword(msg) => AppError::ValidationError(msg),
            AuthError::ProfileNotFound | AuthError::PhoneNotFound => AppError::NotFound(err.to_string()),
            AuthError::StaffOnly => AppError::Forbidden(err.to_string()),
            AuthError::Hashing(_) | AuthError::TokenIssue(_) | AuthError::NotSaved => {
                AppError::Internal(err.to_string())
            }
            AuthError::Clinic(e) => e.into(),
            AuthError::Patient(e) => e.into(),
            AuthError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
