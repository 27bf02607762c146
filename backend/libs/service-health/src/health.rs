//! Health status of a registered service

use std::fmt;

/// Service health status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Service passed its check and can accept traffic
    Ready,
    /// Service failed its check
    NotReady,
    /// No check registered for the service
    Unknown,
}

impl HealthStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, HealthStatus::Ready)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Ready => "ready",
            HealthStatus::NotReady => "not ready",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
