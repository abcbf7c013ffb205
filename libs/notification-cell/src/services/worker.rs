use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::services::{queue::ReminderStore, sms::SmsSender};
use crate::{DeliveryOutcome, NotificationError, ReminderJob, WorkerConfig};

/// Polls the reminder schedule and hands due messages to the SMS gateway.
pub struct ReminderWorker {
    config: WorkerConfig,
    queue: Arc<dyn ReminderStore>,
    sms: Arc<dyn SmsSender>,
    is_shutdown: Arc<RwLock<bool>>,
}

impl ReminderWorker {
    pub fn new(config: WorkerConfig, queue: Arc<dyn ReminderStore>, sms: Arc<dyn SmsSender>) -> Self {
        Self {
            config,
            queue,
            sms,
            is_shutdown: Arc::new(RwLock::new(false)),
        }
    }

    #[instrument(skip(self), fields(worker_id = %self.config.worker_id))]
    pub async fn start(self: Arc<Self>) -> Result<(), NotificationError> {
        info!("Starting reminder worker {}", self.config.worker_id);

        let mut handles = Vec::new();
        let recovery = Arc::clone(&self);
        handles.push(tokio::spawn(async move { recovery.recovery_loop().await }));

        for i in 0..self.config.concurrency.max(1) {
            let worker = Arc::clone(&self);
            let worker_name = format!("{}-{}", self.config.worker_id, i);
            handles.push(tokio::spawn(async move { worker.worker_loop(worker_name).await }));
        }

        futures::future::join_all(handles).await;
        info!("Reminder worker {} stopped", self.config.worker_id);
        Ok(())
    }

    /// Loops finish the batch in hand and then exit.
    pub async fn shutdown(&self) {
        info!("Stopping reminder worker {}", self.config.worker_id);
        *self.is_shutdown.write().await = true;
    }

    async fn is_stopping(&self) -> bool {
        *self.is_shutdown.read().await
    }

    async fn worker_loop(&self, worker_name: String) {
        debug!("Worker loop started: {}", worker_name);
        let idle = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if self.is_stopping().await {
                debug!("Worker {} received shutdown signal", worker_name);
                break;
            }

            match self.process_due(&worker_name).await {
                Ok(0) => tokio::time::sleep(idle).await,
                Ok(processed) => debug!("Worker {} processed {} reminders", worker_name, processed),
                Err(e) => {
                    error!("Worker {} failed to poll reminders: {}", worker_name, e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Sweeps claims left behind by a crashed or failed settle, first at start and then
    /// every `recovery_interval_seconds`.
    async fn recovery_loop(&self) {
        let every = Duration::from_secs(self.config.recovery_interval_seconds.max(1));
        let idle = Duration::from_millis(self.config.poll_interval_ms);
        let mut next_sweep = Instant::now();

        while !self.is_stopping().await {
            if Instant::now() >= next_sweep {
                self.recover_stale().await;
                next_sweep = Instant::now() + every;
            }
            tokio::time::sleep(idle).await;
        }
    }

    pub async fn recover_stale(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.stale_after_seconds as i64);
        match self.queue.requeue_stale(cutoff).await {
            Ok(0) => 0,
            Ok(requeued) => {
                info!("Returned {} unsettled reminders to the schedule", requeued);
                requeued
            }
            Err(e) => {
                warn!("Failed to sweep unsettled reminders: {}", e);
                0
            }
        }
    }

    /// Deliver one batch of due reminders. Returns how many were handled.
    pub async fn process_due(&self, worker_name: &str) -> Result<usize, NotificationError> {
        let jobs = self.queue.claim_due(Utc::now(), self.config.batch_size).await?;
        let count = jobs.len();

        for job in jobs {
            if let Err(e) = self.deliver(job, worker_name).await {
                error!("Worker {} failed to settle reminder, the sweep will retry it: {}", worker_name, e);
            }
        }

        Ok(count)
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    async fn deliver(&self, mut job: ReminderJob, worker_name: &str) -> Result<DeliveryOutcome, NotificationError> {
        debug!("Worker {} delivering reminder to {}", worker_name, job.to_number);

        let error = attempt_delivery(
            self.sms.as_ref(),
            &job,
            Duration::from_secs(self.config.job_timeout_seconds),
        )
        .await
        .err()
        .map(|e| e.to_string());

        let retry_delay = chrono::Duration::seconds(self.config.retry_delay_seconds as i64);
        let outcome = job.record_attempt(error, Utc::now(), retry_delay);
        match &outcome {
            DeliveryOutcome::Delivered => self.queue.complete(&job).await?,
            DeliveryOutcome::RetryAt(at) => {
                warn!(
                    "Reminder {} failed (attempt {}/{}), retrying at {}",
                    job.job_id, job.attempts, job.max_attempts, at
                );
                self.queue.reschedule(&job).await?
            }
            DeliveryOutcome::GaveUp => {
                error!(
                    "Reminder {} to {} dropped after {} attempts: {}",
                    job.job_id,
                    job.to_number,
                    job.attempts,
                    job.last_error.as_deref().unwrap_or("unknown error")
                );
                self.queue.complete(&job).await?
            }
        }
        Ok(outcome)
    }
}

/// One send with a deadline; a hung gateway counts as a failed attempt.
pub async fn attempt_delivery(
    sms: &dyn SmsSender,
    job: &ReminderJob,
    limit: Duration,
) -> Result<(), NotificationError> {
    match timeout(limit, sms.send(&job.to_number, &job.message)).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::Timeout {
            timeout_seconds: limit.as_secs(),
        }),
    }
}
