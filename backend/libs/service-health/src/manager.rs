//! Readiness gate over named service checks

use crate::checks::HealthCheck;
use crate::error::{HealthCheckError, ReadinessError};
use crate::health::HealthStatus;
use resilience::{poll_until_ready, PollConfig, PollError};
use std::time::Duration;

/// Readiness gate
///
/// Holds one health check per service name and waits for services to pass
/// their check. Services are kept in registration order.
pub struct ReadinessGate {
    checks: Vec<(String, Box<dyn HealthCheck>)>,
}

impl ReadinessGate {
    /// Create an empty gate
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Register a health check for `service`, replacing any earlier one.
    pub fn register(&mut self, service: impl Into<String>, check: Box<dyn HealthCheck>) {
        let service = service.into();
        self.checks.retain(|(name, _)| *name != service);
        self.checks.push((service, check));
    }

    /// Registered service names, in registration order
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(name, _)| name.as_str())
    }

    fn find(&self, service: &str) -> Result<&dyn HealthCheck, ReadinessError> {
        self.checks
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, check)| check.as_ref())
            .ok_or_else(|| ReadinessError::UnknownService(service.to_string()))
    }

    /// Run the service's check once.
    pub async fn status(&self, service: &str) -> HealthStatus {
        match self.find(service) {
            Ok(check) => match check.check().await {
                Ok(()) => HealthStatus::Ready,
                Err(e) => {
                    tracing::debug!(service, error = %e, "Service not ready");
                    HealthStatus::NotReady
                }
            },
            Err(_) => HealthStatus::Unknown,
        }
    }

    /// Run every registered check once.
    pub async fn snapshot(&self) -> Vec<(String, HealthStatus)> {
        let mut statuses = Vec::with_capacity(self.checks.len());
        for (name, _) in &self.checks {
            statuses.push((name.clone(), self.status(name).await));
        }
        statuses
    }

    /// Poll `service` until its check passes or `poll.deadline` elapses.
    ///
    /// Returns how long the service took to become ready.
    pub async fn wait_for(
        &self,
        service: &str,
        poll: &PollConfig,
    ) -> Result<Duration, ReadinessError> {
        let check = self.find(service)?;

        tracing::info!(
            service,
            interval = ?poll.interval,
            deadline = ?poll.deadline,
            "Waiting for service"
        );

        match poll_until_ready(poll, || check.check()).await {
            Ok(polled) => {
                tracing::info!(
                    service,
                    elapsed = ?polled.elapsed,
                    attempts = polled.attempts,
                    "✅ Service ready"
                );
                Ok(polled.elapsed)
            }
            Err(err) => {
                let attempts = err.attempts();
                let PollError::DeadlineExceeded { deadline, last_error, .. } = err;
                let last_error = last_error
                    .map(|e: HealthCheckError| e.to_string())
                    .unwrap_or_else(|| "no attempt completed".to_string());

                tracing::error!(
                    service,
                    waited = ?deadline,
                    attempts,
                    error = %last_error,
                    "❌ Service not ready"
                );

                Err(ReadinessError::Timeout {
                    service: service.to_string(),
                    waited: deadline,
                    attempts,
                    last_error,
                })
            }
        }
    }

    /// Wait for every registered service in registration order.
    ///
    /// Returns the first timeout encountered.
    pub async fn wait_for_all(&self, poll: &PollConfig) -> Result<(), ReadinessError> {
        for (name, _) in &self.checks {
            self.wait_for(name, poll).await?;
        }
        Ok(())
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct AlwaysHealthyCheck;

    #[async_trait]
    impl HealthCheck for AlwaysHealthyCheck {
        async fn check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct AlwaysUnhealthyCheck;

    #[async_trait]
    impl HealthCheck for AlwaysUnhealthyCheck {
        async fn check(&self) -> Result<()> {
            Err(HealthCheckError::generic("Always fails"))
        }
    }

    /// Fails the first `failures` calls, then passes.
    struct EventuallyHealthyCheck {
        failures: u32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl HealthCheck for EventuallyHealthyCheck {
        async fn check(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(HealthCheckError::generic("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    fn poll() -> PollConfig {
        PollConfig::new(Duration::from_secs(2), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_ready_service() {
        let mut gate = ReadinessGate::new();
        gate.register("backend", Box::new(AlwaysHealthyCheck));

        let waited = gate.wait_for("backend", &poll()).await.unwrap();
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_stops_once_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut gate = ReadinessGate::new();
        gate.register(
            "mongodb",
            Box::new(EventuallyHealthyCheck {
                failures: 4,
                calls: calls.clone(),
            }),
        );

        let waited = gate.wait_for("mongodb", &poll()).await.unwrap();
        assert_eq!(waited, Duration::from_secs(8));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let mut gate = ReadinessGate::new();
        gate.register("chromadb", Box::new(AlwaysUnhealthyCheck));

        let started = tokio::time::Instant::now();
        let err = gate.wait_for("chromadb", &poll()).await.unwrap_err();

        match err {
            ReadinessError::Timeout {
                service,
                waited,
                attempts,
                last_error,
            } => {
                assert_eq!(service, "chromadb");
                assert_eq!(waited, Duration::from_secs(60));
                assert_eq!(attempts, 30);
                assert!(last_error.contains("Always fails"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(started.elapsed() <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_wait_for_unknown_service() {
        let gate = ReadinessGate::new();
        let err = gate.wait_for("redis", &poll()).await.unwrap_err();
        assert!(matches!(err, ReadinessError::UnknownService(name) if name == "redis"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_all_stops_at_first_timeout() {
        let mut gate = ReadinessGate::new();
        gate.register("mongodb", Box::new(AlwaysHealthyCheck));
        gate.register("chromadb", Box::new(AlwaysUnhealthyCheck));
        gate.register("backend", Box::new(AlwaysHealthyCheck));

        let err = gate.wait_for_all(&poll()).await.unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout { service, .. } if service == "chromadb"));
    }

    #[tokio::test]
    async fn test_snapshot_reports_each_service() {
        let mut gate = ReadinessGate::new();
        gate.register("mongodb", Box::new(AlwaysHealthyCheck));
        gate.register("backend", Box::new(AlwaysUnhealthyCheck));

        let snapshot = gate.snapshot().await;
        assert_eq!(
            snapshot,
            vec![
                ("mongodb".to_string(), HealthStatus::Ready),
                ("backend".to_string(), HealthStatus::NotReady),
            ]
        );
        assert_eq!(gate.status("chromadb").await, HealthStatus::Unknown);
    }

    #[test]
    fn test_register_replaces_existing_check() {
        let mut gate = ReadinessGate::default();
        gate.register("backend", Box::new(AlwaysUnhealthyCheck));
        gate.register("backend", Box::new(AlwaysHealthyCheck));

        assert_eq!(gate.services().collect::<Vec<_>>(), vec!["backend"]);
    }
}
