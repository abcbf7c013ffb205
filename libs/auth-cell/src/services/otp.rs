use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use patient_cell::Patient;

use crate::AuthError;

pub const OTP_DIGITS: usize = 6;

pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", code, width = OTP_DIGITS)
}

pub fn otp_expiry(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(ttl_minutes)
}

/// Checks a submitted code against the one stored on the patient.
pub fn check_otp(patient: &Patient, submitted: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
    if patient.otp.as_deref() != Some(submitted.trim()) {
        return Err(AuthError::InvalidOtp);
    }
    match patient.otp_expiry {
        Some(expiry) if expiry >= now => Ok(()),
        _ => Err(AuthError::OtpExpired),
    }
}
