use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::{NotificationError, ReminderJob};

const SCHEDULE_KEY: &str = "reminders:scheduled";
const PROCESSING_KEY: &str = "reminders:processing";
const JOB_RETENTION_SECONDS: i64 = 7 * 24 * 60 * 60;

// Moves due ids from the schedule into the processing set in one step.
const CLAIM_SCRIPT: &str = r#"
local ids = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, id in ipairs(ids) do
    redis.call('ZREM', KEYS[1], id)
    redis.call('ZADD', KEYS[2], ARGV[1], id)
end
return ids
"#;

fn job_key(job_id: impl std::fmt::Display) -> String {
    format!("reminder_job:{}", job_id)
}

/// Where the worker claims and settles reminders.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn claim_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ReminderJob>, NotificationError>;

    /// Delivered or given up: forget the job.
    async fn complete(&self, job: &ReminderJob) -> Result<(), NotificationError>;

    /// Put the job back on the schedule at its new `scheduled_for`.
    async fn reschedule(&self, job: &ReminderJob) -> Result<(), NotificationError>;

    /// Return claims older than `claimed_before` to the schedule. Returns how many were requeued.
    async fn requeue_stale(&self, claimed_before: DateTime<Utc>) -> Result<usize, NotificationError>;
}

/// Delayed SMS reminders: job payloads live in hashes, due times in a sorted set.
/// Claimed ids sit in a processing set until the worker settles them.
pub struct ReminderQueueService {
    pool: Pool,
}

impl ReminderQueueService {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        let cfg = Config::from_url(config.redis_url_or_default());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| NotificationError::PoolError(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<(), NotificationError> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Reminder queue connected to Redis");
        Ok(())
    }

    pub async fn enqueue_reminder(&self, job: &ReminderJob) -> Result<(), NotificationError> {
        let mut conn = self.get_connection().await?;
        self.store_job(&mut conn, job).await?;

        let _: () = conn
            .zadd(SCHEDULE_KEY, job.job_id.to_string(), job.scheduled_for.timestamp())
            .await?;

        debug!("Reminder {} scheduled for {}", job.job_id, job.scheduled_for);
        Ok(())
    }

    pub async fn enqueue_all(&self, jobs: &[ReminderJob]) -> Result<usize, NotificationError> {
        for job in jobs {
            self.enqueue_reminder(job).await?;
        }
        Ok(jobs.len())
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<ReminderJob>, NotificationError> {
        let mut conn = self.get_connection().await?;
        Self::load_job(&mut conn, &job_id.to_string()).await
    }

    pub async fn pending_count(&self) -> Result<u64, NotificationError> {
        let mut conn = self.get_connection().await?;
        let count: u64 = conn.zcard(SCHEDULE_KEY).await?;
        Ok(count)
    }

    pub async fn in_flight_count(&self) -> Result<u64, NotificationError> {
        let mut conn = self.get_connection().await?;
        let count: u64 = conn.zcard(PROCESSING_KEY).await?;
        Ok(count)
    }

    async fn get_connection(&self) -> Result<Connection, NotificationError> {
        self.pool
            .get()
            .await
            .map_err(|e| NotificationError::PoolError(format!("Failed to get Redis connection: {}", e)))
    }

    async fn load_job(conn: &mut Connection, job_id: &str) -> Result<Option<ReminderJob>, NotificationError> {
        let data: Option<String> = conn.hget(job_key(job_id), "data").await?;
        data.map(|data| serde_json::from_str(&data))
            .transpose()
            .map_err(NotificationError::from)
    }

    async fn store_job(&self, conn: &mut Connection, job: &ReminderJob) -> Result<(), NotificationError> {
        let key = job_key(job.job_id);
        let data = serde_json::to_string(job)?;
        let scheduled_for = job.scheduled_for.to_rfc3339();

        let _: () = conn
            .hset_multiple(&key, &[
                ("data", data.as_str()),
                ("scheduled_for", scheduled_for.as_str()),
                ("to_number", job.to_number.as_str()),
            ])
            .await?;

        let ttl = (job.scheduled_for - Utc::now()).num_seconds().max(0) + JOB_RETENTION_SECONDS;
        let _: () = redis::cmd("EXPIRE").arg(&key).arg(ttl).query_async(conn).await?;

        Ok(())
    }
}

#[async_trait]
impl ReminderStore for ReminderQueueService {
    /// Claim up to `limit` reminders due at `now`. The move into the processing set is
    /// atomic, so two workers never deliver the same reminder.
    async fn claim_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ReminderJob>, NotificationError> {
        let mut conn = self.get_connection().await?;

        let claimed_ids: Vec<String> = redis::Script::new(CLAIM_SCRIPT)
            .key(SCHEDULE_KEY)
            .key(PROCESSING_KEY)
            .arg(now.timestamp())
            .arg(limit)
            .invoke_async(&mut conn)
            .await?;

        let mut claimed = Vec::with_capacity(claimed_ids.len());
        for job_id in claimed_ids {
            match Self::load_job(&mut conn, &job_id).await? {
                Some(job) => claimed.push(job),
                None => {
                    debug!("Reminder {} expired before delivery", job_id);
                    let _: () = conn.zrem(PROCESSING_KEY, &job_id).await?;
                }
            }
        }

        Ok(claimed)
    }

    async fn complete(&self, job: &ReminderJob) -> Result<(), NotificationError> {
        let mut conn = self.get_connection().await?;
        let job_id = job.job_id.to_string();

        let _: () = redis::pipe()
            .atomic()
            .del(job_key(&job_id))
            .ignore()
            .zrem(PROCESSING_KEY, &job_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("Reminder {} completed", job.job_id);
        Ok(())
    }

    async fn reschedule(&self, job: &ReminderJob) -> Result<(), NotificationError> {
        let mut conn = self.get_connection().await?;
        self.store_job(&mut conn, job).await?;

        let job_id = job.job_id.to_string();
        let _: () = redis::pipe()
            .atomic()
            .zadd(SCHEDULE_KEY, &job_id, job.scheduled_for.timestamp())
            .ignore()
            .zrem(PROCESSING_KEY, &job_id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("Reminder {} rescheduled for {}", job.job_id, job.scheduled_for);
        Ok(())
    }

    async fn requeue_stale(&self, claimed_before: DateTime<Utc>) -> Result<usize, NotificationError> {
        let mut conn = self.get_connection().await?;
        let stale: Vec<String> = conn
            .zrangebyscore(PROCESSING_KEY, "-inf", claimed_before.timestamp())
            .await?;

        let mut requeued = 0;
        for job_id in stale {
            match Self::load_job(&mut conn, &job_id).await? {
                Some(job) => {
                    let _: () = redis::pipe()
                        .atomic()
                        .zadd(SCHEDULE_KEY, &job_id, job.scheduled_for.timestamp())
                        .ignore()
                        .zrem(PROCESSING_KEY, &job_id)
                        .ignore()
                        .query_async(&mut conn)
                        .await?;
                    warn!("Reminder {} was never settled, returned to the schedule", job_id);
                    requeued += 1;
                }
                None => {
                    let _: () = conn.zrem(PROCESSING_KEY, &job_id).await?;
                }
            }
        }

        Ok(requeued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn job_keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(job_key(id), "reminder_job:00000000-0000-0000-0000-000000000000");
    }

    // Needs a running Redis: REDIS_TEST_URL=redis://127.0.0.1:6379 cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn claims_only_due_reminders_once() {
        let url = std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let config = AppConfig {
            redis_url: Some(url),
            ..AppConfig::default()
        };
        let queue = ReminderQueueService::new(&config).unwrap();
        queue.ping().await.unwrap();

        let now = Utc::now();
        let due = ReminderJob::new("+919800000001", "due", now - Duration::seconds(5));
        let later = ReminderJob::new("+919800000001", "later", now + Duration::hours(1));
        queue.enqueue_all(&[due.clone(), later.clone()]).await.unwrap();

        let claimed = queue.claim_due(now, 100).await.unwrap();
        assert!(claimed.iter().any(|job| job.job_id == due.job_id));
        assert!(claimed.iter().all(|job| job.job_id != later.job_id));

        let again = queue.claim_due(now, 100).await.unwrap();
        assert!(again.iter().all(|job| job.job_id != due.job_id));

        queue.complete(&due).await.unwrap();
        assert!(queue.get_job(due.job_id).await.unwrap().is_none());
        assert!(queue.get_job(later.job_id).await.unwrap().is_some());
    }

    // Needs a running Redis, like the test above.
    #[tokio::test]
    #[ignore]
    async fn unsettled_claims_return_to_the_schedule() {
        let url = std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let config = AppConfig {
            redis_url: Some(url),
            ..AppConfig::default()
        };
        let queue = ReminderQueueService::new(&config).unwrap();

        let claimed_at = Utc::now() - Duration::minutes(10);
        let job = ReminderJob::new("+919800000002", "stranded", claimed_at - Duration::seconds(5));
        queue.enqueue_reminder(&job).await.unwrap();

        let claimed = queue.claim_due(claimed_at, 100).await.unwrap();
        assert!(claimed.iter().any(|j| j.job_id == job.job_id));
        assert!(queue.in_flight_count().await.unwrap() >= 1);

        let requeued = queue.requeue_stale(Utc::now() - Duration::minutes(5)).await.unwrap();
        assert!(requeued >= 1);

        let again = queue.claim_due(Utc::now(), 100).await.unwrap();
        assert!(again.iter().any(|j| j.job_id == job.job_id));
        queue.complete(&job).await.unwrap();
    }
}
