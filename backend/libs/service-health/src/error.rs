//! Error types for health check operations

use std::time::Duration;
use thiserror::Error;

/// Result type for health check operations
pub type Result<T> = std::result::Result<T, HealthCheckError>;

/// Errors that can occur during a single health check
#[derive(Debug, Error)]
pub enum HealthCheckError {
    /// HTTP request failure or unexpected response
    #[error("HTTP health check failed: {0}")]
    Http(String),

    /// Datastore connection or command failure
    #[error("Datastore health check failed: {0}")]
    Datastore(String),

    /// Generic health check failure
    #[error("Health check failed: {0}")]
    Generic(String),
}

impl HealthCheckError {
    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a datastore error
    pub fn datastore(msg: impl Into<String>) -> Self {
        Self::Datastore(msg.into())
    }

    /// Create a generic error
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }
}

/// Errors raised while waiting for a service to become ready
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The service did not pass its check before the deadline
    #[error("{service} not ready after {waited:?} ({attempts} attempts): {last_error}")]
    Timeout {
        service: String,
        waited: Duration,
        attempts: u32,
        last_error: String,
    },

    /// No check registered under this name
    #[error("No readiness check registered for service '{0}'")]
    UnknownService(String),

    /// HTTP client for the probes could not be built
    #[error("Failed to build readiness probe client: {0}")]
    Client(String),
}
