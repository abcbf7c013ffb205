use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use clinic_cell::StaffService;
use notification_cell::SmsService;
use patient_cell::{NewPatient, Patient, PatientService, PatientView};
use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::extract::Json;
use shared_utils::jwt::issue_token;

use crate::models::{
    otp_message, welcome_message, LoginRequest, LoginResponse, MessageResponse, Profile,
    ProfileWithRole, ReceptionistView, RegisterRequest, RegisterResponse, RegisteredUser,
    Registration, ResendOtpRequest, VerifyOtpRequest,
};
use crate::services::{
    check_otp, generate_otp, hash_password, otp_expiry, validate_password, verify_password,
    AccountService,
};
use crate::AuthError;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Field checks that need no database access.
pub fn validate_registration(request: RegisterRequest) -> Result<Registration, AuthError> {
    let (Some(username), Some(password), Some(password2), Some(name), Some(age), Some(phone_number)) = (
        non_empty(request.username),
        request.password.filter(|p| !p.is_empty()),
        request.password2.filter(|p| !p.is_empty()),
        non_empty(request.name),
        request.age,
        non_empty(request.phone_number),
    ) else {
        return Err(AuthError::MissingFields);
    };

    if !phone_number.starts_with('+') {
        return Err(AuthError::InvalidPhone);
    }
    if password != password2 {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(&password)?;

    Ok(Registration {
        username,
        password,
        name,
        age,
        phone_number,
    })
}

fn session_token(config: &AppConfig, user: &User) -> Result<String, AuthError> {
    issue_token(user, &config.jwt_secret, config.jwt_expiry_hours).map_err(AuthError::TokenIssue)
}

async fn send_otp(config: &AppConfig, patient: &Patient) -> Result<(), AuthError> {
    let Some(phone) = patient.phone_number.as_deref() else {
        return Ok(());
    };

    let otp = generate_otp();
    PatientService::new(config)
        .set_otp(patient.id, &otp, otp_expiry(Utc::now(), config.otp_ttl_minutes))
        .await?;
    SmsService::from_config(config)
        .notify(phone, &otp_message(&otp, config.otp_ttl_minutes))
        .await;
    Ok(())
}

/// The phone is taken when a patient row with it belongs to an account. Walk-in rows are
/// returned so the new account can claim them.
async fn walk_in_for_phone(config: &AppConfig, phone_number: &str) -> Result<Option<Patient>, AuthError> {
    let Some(existing) = PatientService::new(config).find_by_phone(phone_number).await? else {
        return Ok(None);
    };

    match existing.user_id {
        None => Ok(Some(existing)),
        Some(user_id) => {
            let owner = AccountService::new(config).get_user(user_id).await?;
            if !owner.is_some_and(|u| u.is_active) {
                // The unique phone column cannot hold a second row for the number.
                warn!("Phone {} is held by inactive account {}", phone_number, user_id);
            }
            Err(AuthError::PhoneTaken)
        }
    }
}

#[axum::debug_handler]
pub async fn register_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = validate_registration(request)?;
    debug!("Registering patient account {}", registration.username);

    let accounts = AccountService::new(&config);
    if accounts.username_taken(&registration.username).await? {
        return Err(AuthError::UsernameTaken.into());
    }
    let walk_in = walk_in_for_phone(&config, &registration.phone_number).await?;

    let password_hash = hash_password(&registration.password)?;
    let account = accounts
        .create_user(&registration.username, &password_hash, Role::Patient)
        .await?;

    let patients = PatientService::new(&config);
    let saved = match walk_in {
        Some(record) => {
            patients
                .claim_walk_in(record.id, account.id, &registration.name, registration.age)
                .await
        }
        None => {
            patients
                .create_patient(NewPatient {
                    name: registration.name.clone(),
                    age: registration.age,
                    phone_number: Some(registration.phone_number.clone()),
                    user_id: Some(account.id),
                })
                .await
        }
    };
    let patient = match saved {
        Ok(patient) => patient,
        Err(e) => {
            error!("Patient profile for {} failed, removing account: {}", account.username, e);
            if let Err(cleanup) = accounts.delete_user(account.id).await {
                error!("Could not remove account {}: {}", account.id, cleanup);
            }
            return Err(e.into());
        }
    };

    if let Err(e) = send_otp(&config, &patient).await {
        warn!("Could not issue OTP for patient {}: {}", patient.id, e);
    }
    SmsService::from_config(&config)
        .notify(&registration.phone_number, &welcome_message(&patient.name))
        .await;

    let token = session_token(&config, &account.to_user())?;
    info!("Patient {} registered as {}", patient.id, account.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Patient registered successfully.".to_string(),
            token,
            user: RegisteredUser {
                username: account.username,
                name: patient.name,
                age: patient.age,
                role: Role::Patient,
                phone_number: patient.phone_number,
            },
        }),
    ))
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(phone_number), Some(otp)) = (non_empty(request.phone_number), non_empty(request.otp)) else {
        return Err(AppError::BadRequest("Phone number and OTP are required.".to_string()));
    };

    let patients = PatientService::new(&config);
    let patient = patients
        .find_by_phone(&phone_number)
        .await?
        .ok_or(AuthError::PhoneNotFound)?;

    if patient.is_phone_verified {
        return Ok(Json(MessageResponse::new(AuthError::AlreadyVerified.to_string())));
    }
    check_otp(&patient, &otp, Utc::now())?;

    patients.mark_phone_verified(patient.id).await?;
    Ok(Json(MessageResponse::new("Phone number verified successfully.")))
}

#[axum::debug_handler]
pub async fn resend_otp(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let Some(phone_number) = non_empty(request.phone_number) else {
        return Err(AppError::BadRequest("Phone number is required.".to_string()));
    };

    let patient = PatientService::new(&config)
        .find_by_phone(&phone_number)
        .await?
        .ok_or(AuthError::PhoneNotFound)?;
    if patient.is_phone_verified {
        return Err(AuthError::AlreadyVerified.into());
    }

    send_otp(&config, &patient).await?;
    Ok(Json(MessageResponse::new("A new OTP has been sent to your phone.")))
}

async fn authenticate(config: &AppConfig, request: LoginRequest) -> Result<User, AuthError> {
    let (Some(username), Some(password)) = (non_empty(request.username), request.password) else {
        return Err(AuthError::InvalidCredentials);
    };

    let account = AccountService::new(config)
        .find_by_username(&username)
        .await?
        .filter(|account| account.is_active)
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&password, &account.password_hash) {
        debug!("Password mismatch for {}", username);
        return Err(AuthError::InvalidCredentials);
    }
    Ok(account.to_user())
}

async fn load_profile(config: &AppConfig, user: &User) -> Result<Profile, AuthError> {
    let staff = StaffService::new(config);
    let profile = match user.role {
        Role::Doctor => staff
            .doctor_for_user(user.id)
            .await?
            .map(|doctor| Profile::Doctor((&doctor).into())),
        Role::Receptionist => staff.receptionist_for_user(user.id).await?.map(|receptionist| {
            Profile::Receptionist(ReceptionistView {
                username: user.username.clone(),
                clinic: receptionist.clinic,
            })
        }),
        Role::Patient => PatientService::new(config)
            .patient_for_user(user.id)
            .await?
            .map(|patient| Profile::Patient(PatientView::from(&patient))),
    };
    profile.ok_or(AuthError::ProfileNotFound)
}

async fn login_response(config: &AppConfig, user: User) -> Result<LoginResponse, AuthError> {
    let profile = load_profile(config, &user).await?;
    let token = session_token(config, &user)?;
    info!("{} {} logged in", user.role, user.username);

    Ok(LoginResponse {
        token,
        user: ProfileWithRole {
            profile,
            role: user.role,
        },
    })
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = authenticate(&config, request).await?;
    Ok(Json(login_response(&config, user).await?))
}

#[axum::debug_handler]
pub async fn staff_login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = authenticate(&config, request).await?;
    if !user.is_staff() {
        return Err(AuthError::StaffOnly.into());
    }
    Ok(Json(login_response(&config, user).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: Some(" ravi ".to_string()),
            password: Some("clinic-visit-9".to_string()),
            password2: Some("clinic-visit-9".to_string()),
            name: Some("Ravi Kumar".to_string()),
            age: Some(34),
            phone_number: Some("+919800000001".to_string()),
        }
    }

    #[test]
    fn registration_fields_are_trimmed() {
        let registration = validate_registration(request()).unwrap();
        assert_eq!(registration.username, "ravi");
        assert_eq!(registration.age, 34);
    }

    #[test]
    fn registration_rejects_bad_input() {
        assert_matches!(
            validate_registration(RegisterRequest { age: None, ..request() }),
            Err(AuthError::MissingFields)
        );
        assert_matches!(
            validate_registration(RegisterRequest { phone_number: Some("9800000001".into()), ..request() }),
            Err(AuthError::InvalidPhone)
        );
        assert_matches!(
            validate_registration(RegisterRequest { password2: Some("other-pass-1".into()), ..request() }),
            Err(AuthError::PasswordMismatch)
        );
        assert_matches!(
            validate_registration(RegisterRequest {
                password: Some("12345678".into()),
                password2: Some("12345678".into()),
                ..request()
            }),
            Err(AuthError::WeakPassword(_))
        );
    }
}
