use chrono::NaiveDate;
use tracing::{debug, info};

use clinic_cell::Doctor;
use notification_cell::SmsService;
use patient_cell::PatientService;
use shared_config::AppConfig;
use token_cell::{TokenRecord, TokenService};

use crate::models::{caller_patient_name, spoken_digits};
use crate::IvrError;

#[derive(Debug)]
pub enum PhoneBooking {
    AlreadyActive,
    Booked(TokenRecord),
}

impl PhoneBooking {
    pub fn farewell(&self, doctor: &Doctor) -> String {
        match self {
            PhoneBooking::AlreadyActive => {
                "You already have an active token for today. Please check your SMS. Goodbye.".to_string()
            }
            PhoneBooking::Booked(token) => format!(
                "You have been assigned to Doctor {}. Your token is {}. An SMS has been sent. Goodbye.",
                doctor.name,
                spoken_digits(token.token_number.unwrap_or_default())
            ),
        }
    }
}

pub fn booking_sms(token: &TokenRecord) -> String {
    format!(
        "Your token for Dr. {} at {} is {}.",
        token.doctor_name(),
        token.clinic_name(),
        token.token_number.unwrap_or_default()
    )
}

/// Books a same-day token for a caller, creating a walk-in patient for unknown numbers.
pub async fn book_for_caller(
    config: &AppConfig,
    doctor: &Doctor,
    caller: &str,
    today: NaiveDate,
) -> Result<PhoneBooking, IvrError> {
    debug!("Phone booking with doctor {} for {}", doctor.id, caller);

    let patient = PatientService::new(config)
        .get_or_create_by_phone(caller, &caller_patient_name(caller), 0)
        .await?;

    let tokens = TokenService::new(config);
    if tokens.has_active_token(patient.id, today).await? {
        return Ok(PhoneBooking::AlreadyActive);
    }

    let token = tokens.issue_token(&patient, doctor, today, None).await?;
    info!("Phone booking gave token {:?} to patient {}", token.token_number, patient.id);

    SmsService::from_config(config).notify(caller, &booking_sms(&token)).await;
    Ok(PhoneBooking::Booked(token))
}
