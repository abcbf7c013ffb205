use clinic_cell::{Clinic, Doctor};

use crate::models::{booking_type_url, specific_doctor_url, SELECT_CLINIC_URL, WELCOME_URL};
use crate::twiml::VoiceResponse;

pub const INVALID_CHOICE: &str = "Invalid choice.";
pub const NO_DOCTORS: &str = "Sorry, no doctors are available.";

pub fn clinic_menu(clinics: &[Clinic]) -> VoiceResponse {
    if clinics.is_empty() {
        return VoiceResponse::new()
            .say("Sorry, no clinics are configured. Goodbye.")
            .hangup();
    }

    let mut prompt = String::from("Welcome. Please select a clinic. ");
    for (i, clinic) in clinics.iter().enumerate() {
        prompt.push_str(&format!("For {}, press {}. ", clinic.name, i + 1));
    }

    VoiceResponse::new()
        .gather(1, SELECT_CLINIC_URL, prompt.trim_end())
        .redirect(WELCOME_URL)
}

pub fn booking_type_menu(response: VoiceResponse, clinic: &Clinic) -> VoiceResponse {
    response
        .gather(
            1,
            booking_type_url(clinic.id),
            format!(
                "You selected {}. For next available doctor, press 1. To choose a specific doctor, press 2.",
                clinic.name
            ),
        )
        .redirect(WELCOME_URL)
}

pub fn doctor_menu(response: VoiceResponse, clinic_id: i64, doctors: &[Doctor]) -> VoiceResponse {
    if doctors.is_empty() {
        return response.say(NO_DOCTORS).hangup();
    }

    let mut prompt = String::from("Please select a doctor. ");
    for (i, doctor) in doctors.iter().enumerate() {
        prompt.push_str(&format!("For Doctor {}, press {}. ", doctor.name, i + 1));
    }

    response.gather(1, specific_doctor_url(clinic_id), prompt.trim_end())
}

pub fn invalid_choice() -> VoiceResponse {
    VoiceResponse::new().say(INVALID_CHOICE)
}

pub fn goodbye(message: &str) -> VoiceResponse {
    VoiceResponse::new().say(message).hangup()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twiml::Verb;

    fn clinic(id: i64, name: &str) -> Clinic {
        Clinic {
            id,
            name: name.to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            latitude: None,
            longitude: None,
        }
    }

    fn doctor(id: i64, name: &str) -> Doctor {
        Doctor {
            id,
            user_id: None,
            name: name.to_string(),
            specialization: "General Medicine".to_string(),
            clinic_id: Some(1),
            role: "doctor".to_string(),
            user: None,
        }
    }

    #[test]
    fn clinic_menu_lists_every_clinic() {
        let menu = clinic_menu(&[clinic(1, "City Clinic"), clinic(2, "Lake Clinic")]);
        assert_eq!(
            menu.verbs()[0],
            Verb::Gather {
                num_digits: 1,
                action: "/api/ivr/select_clinic/".to_string(),
                prompt: "Welcome. Please select a clinic. For City Clinic, press 1. For Lake Clinic, press 2."
                    .to_string(),
            }
        );
        assert_eq!(menu.verbs()[1], Verb::Redirect("/api/ivr/welcome/".to_string()));
    }

    #[test]
    fn empty_directories_hang_up() {
        assert_eq!(clinic_menu(&[]).verbs().last(), Some(&Verb::Hangup));

        let menu = doctor_menu(invalid_choice(), 1, &[]);
        assert_eq!(
            menu.verbs(),
            &[
                Verb::Say(INVALID_CHOICE.to_string()),
                Verb::Say(NO_DOCTORS.to_string()),
                Verb::Hangup
            ]
        );
    }

    #[test]
    fn doctor_menu_posts_to_clinic_handler() {
        let menu = doctor_menu(VoiceResponse::new(), 4, &[doctor(3, "Mehta")]);
        assert!(menu.to_xml().contains(r#"action="/api/ivr/handle_specific_doctor/4/""#));
        assert!(menu.to_xml().contains("For Doctor Mehta, press 1."));
    }
}
