//! Error types for the persistence probe.

use service_health::ReadinessError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Fatal failures of a probe run.
///
/// Soft failures are not errors; they are collected as warnings on the
/// probe context and never abort the run.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Container runtime missing or not answering
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// Service did not become ready before its deadline
    #[error("Service '{service}' not ready within {waited:?}: {detail}")]
    ReadinessTimeout {
        service: String,
        waited: Duration,
        detail: String,
    },

    /// Expected content or record absent
    #[error("{check} failed: {detail}")]
    Assertion { check: String, detail: String },

    /// Chat response carried no conversation identifier
    #[error("No conversation_id in chat response: {body}")]
    ConversationIdMissing { body: String },

    /// Conversation record not found in the datastore
    #[error("Conversation {0} not found in datastore")]
    RecordMissing(String),

    /// Message count changed across a restart
    #[error("Conversation {conversation_id} had {before} messages before restart and {after} after")]
    MessageCountChanged {
        conversation_id: String,
        before: usize,
        after: usize,
    },

    /// External command exited non-zero or timed out
    #[error("Command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Datastore failure
    #[error("Datastore error: {0}")]
    Datastore(#[from] mongodb::error::Error),

    /// Local file failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn assertion(check: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Assertion {
            check: check.into(),
            detail: detail.into(),
        }
    }
}

impl From<ReadinessError> for ProbeError {
    fn from(err: ReadinessError) -> Self {
        match err {
            ReadinessError::Timeout {
                service,
                waited,
                attempts,
                last_error,
            } => ProbeError::ReadinessTimeout {
                service,
                waited,
                detail: format!("{} attempts, last error: {}", attempts, last_error),
            },
            other => ProbeError::Config(other.to_string()),
        }
    }
}
