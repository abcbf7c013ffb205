use serde::Deserialize;

pub const WELCOME_URL: &str = "/api/ivr/welcome/";
pub const SELECT_CLINIC_URL: &str = "/api/ivr/select_clinic/";

pub const UNKNOWN_CALLER: &str = "Unknown";

/// The webhook fields the phone tree reads. Twilio posts many more; they are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IvrForm {
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
}

impl IvrForm {
    pub fn caller(&self) -> &str {
        self.from
            .as_deref()
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .unwrap_or(UNKNOWN_CALLER)
    }

    /// The pressed key as a 1-based menu index.
    pub fn choice(&self) -> Option<usize> {
        self.digits
            .as_deref()
            .and_then(|d| d.trim().parse::<usize>().ok())
            .filter(|n| *n >= 1)
    }
}

pub fn booking_type_url(clinic_id: i64) -> String {
    format!("/api/ivr/handle_booking_type/{}/", clinic_id)
}

pub fn specific_doctor_url(clinic_id: i64) -> String {
    format!("/api/ivr/handle_specific_doctor/{}/", clinic_id)
}

/// Name given to a patient record created for an unknown caller.
pub fn caller_patient_name(caller: &str) -> String {
    let chars: Vec<char> = caller.chars().collect();
    let last_four: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("IVR Patient {}", last_four)
}

/// "12" is read out as "1 2".
pub fn spoken_digits(number: i32) -> String {
    number
        .to_string()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}
