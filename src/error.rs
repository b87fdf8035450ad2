use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("github api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("rate limited ({status}), resets at {}", reset_label(.reset))]
    RateLimited {
        status: u16,
        reset: Option<DateTime<Utc>>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl AuditError {
    /// Whether a per-fork lookup may absorb this failure and carry on with
    /// absent data. Contract violations never qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuditError::Transport(_) | AuditError::Api { .. } | AuditError::RateLimited { .. }
        )
    }
}

fn reset_label(reset: &Option<DateTime<Utc>>) -> String {
    reset
        .map(|r| r.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type Result<T> = std::result::Result<T, AuditError>;
