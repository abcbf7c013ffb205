use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use clinic_cell::ClinicError;
use patient_cell::PatientError;
use token_cell::TokenError;

use crate::twiml::VoiceResponse;

pub const APOLOGY: &str = "Sorry, we could not complete your request. Please try again later. Goodbye.";

#[derive(Error, Debug)]
pub enum IvrError {
    #[error(transparent)]
    Clinic(#[from] ClinicError),

    #[error(transparent)]
    Patient(#[from] PatientError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// A caller cannot read a JSON error, so failures are spoken and the call ends.
impl IntoResponse for IvrError {
    fn into_response(self) -> Response {
        error!("IVR request failed: {}", self);
        VoiceResponse::new().say(APOLOGY).hangup().into_response()
    }
}
