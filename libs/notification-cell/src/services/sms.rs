use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::NotificationError;

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to_number: &str, body: &str) -> Result<(), NotificationError>;
}

/// Logs the message instead of delivering it. Default when no gateway is configured.
pub struct ConsoleSmsSender;

#[async_trait]
impl SmsSender for ConsoleSmsSender {
    async fn send(&self, to_number: &str, body: &str) -> Result<(), NotificationError> {
        info!(to = %to_number, "SMS SIMULATION: {}", body);
        Ok(())
    }
}

pub struct TwilioSmsSender {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsSender {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.twilio_api_base.trim_end_matches('/').to_string(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        }
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to_number: &str, body: &str) -> Result<(), NotificationError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );
        debug!("Sending SMS to {} via Twilio", to_number);

        let response = self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to_number),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotificationError::DeliveryFailed(format!(
                "Twilio error ({}): {}",
                status, error_text
            )));
        }

        info!("SMS delivered to {}", to_number);
        Ok(())
    }
}

/// Keeps every message in memory; used to assert on outgoing SMS in tests.
#[derive(Default)]
pub struct RecordingSmsSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, to_number: &str, body: &str) -> Result<(), NotificationError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to_number.to_string(), body.to_string()));
        }
        Ok(())
    }
}

pub fn sms_sender_from_config(config: &AppConfig) -> Arc<dyn SmsSender> {
    if config.sms_provider.eq_ignore_ascii_case("twilio") && config.is_twilio_configured() {
        Arc::new(TwilioSmsSender::new(config))
    } else {
        Arc::new(ConsoleSmsSender)
    }
}

#[derive(Clone)]
pub struct SmsService {
    sender: Arc<dyn SmsSender>,
}

impl SmsService {
    pub fn new(sender: Arc<dyn SmsSender>) -> Self {
        Self { sender }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(sms_sender_from_config(config))
    }

    /// Fire-and-forget delivery: a failed SMS never fails the request that triggered it.
    pub async fn notify(&self, to_number: &str, body: &str) -> bool {
        match self.sender.send(to_number, body).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send SMS to {}: {}", to_number, e);
                false
            }
        }
    }
}
