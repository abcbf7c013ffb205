use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A text message held back until `scheduled_for`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderJob {
    pub job_id: Uuid,
    pub to_number: String,
    pub message: String,
    pub scheduled_for: DateTime<Utc>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl ReminderJob {
    pub fn new(to_number: impl Into<String>, message: impl Into<String>, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            to_number: to_number.into(),
            message: message.into(),
            scheduled_for,
            attempts: 0,
            max_attempts: 3,
            created_at: Utc::now(),
            last_error: None,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Record a delivery attempt and decide what happens next.
    pub fn record_attempt(
        &mut self,
        error: Option<String>,
        now: DateTime<Utc>,
        retry_delay: Duration,
    ) -> DeliveryOutcome {
        self.attempts += 1;

        match error {
            None => {
                self.last_error = None;
                DeliveryOutcome::Delivered
            }
            Some(message) => {
                self.last_error = Some(message);
                if self.can_retry() {
                    let retry_at = now + retry_delay;
                    self.scheduled_for = retry_at;
                    DeliveryOutcome::RetryAt(retry_at)
                } else {
                    DeliveryOutcome::GaveUp
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    RetryAt(DateTime<Utc>),
    GaveUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub concurrency: u32,
    pub job_timeout_seconds: u64,
    pub retry_delay_seconds: u64,
    pub poll_interval_ms: u64,
    pub batch_size: usize,
    /// A claim older than this is assumed lost with its worker.
    pub stale_after_seconds: u64,
    pub recovery_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("reminder-worker-{}", Uuid::new_v4()),
            concurrency: 4,
            job_timeout_seconds: 90,
            retry_delay_seconds: 120,
            poll_interval_ms: 1000,
            batch_size: 10,
            stale_after_seconds: 300,
            recovery_interval_seconds: 60,
        }
    }
}
