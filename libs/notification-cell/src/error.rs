use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Redis connection error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    PoolError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("SMS delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("SMS gateway request failed: {0}")]
    GatewayError(#[from] reqwest::Error),

    #[error("Delivery timed out after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },
}
