use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decoding error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }

    /// PostgREST reports unique violations as 409 with Postgres code 23505.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 409 || body.contains("\"23505\"") {
            return DatabaseError::Conflict(body);
        }

        match status {
            401 | 403 => DatabaseError::Auth(body),
            404 => DatabaseError::NotFound(body),
            _ => DatabaseError::Api { status, message: body },
        }
    }
}
