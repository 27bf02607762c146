//! Builder pattern for easy readiness gate construction

use crate::checks::{HealthCheck, HttpHealthCheck, MongoHealthCheck};
use crate::error::ReadinessError;
use crate::manager::ReadinessGate;
use std::time::Duration;

enum PendingCheck {
    Http { url: String, expect: Option<String> },
    Mongo(mongodb::Client),
    Custom(Box<dyn HealthCheck>),
}

/// Builder for ReadinessGate with common dependency checks
///
/// All HTTP checks share one client whose timeout bounds a single attempt.
///
/// # Example
///
/// ```rust,no_run
/// use service_health::ReadinessGateBuilder;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mongo = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
///
/// let gate = ReadinessGateBuilder::new()
///     .with_attempt_timeout(Duration::from_secs(5))
///     .with_mongo("mongodb", mongo)
///     .with_http("chromadb", "http://localhost:8001/api/v1/heartbeat", None::<String>)
///     .with_http("backend", "http://localhost:8000/health", Some("healthy"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ReadinessGateBuilder {
    attempt_timeout: Duration,
    pending: Vec<(String, PendingCheck)>,
}

impl ReadinessGateBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            pending: Vec::new(),
        }
    }

    /// Set the per-attempt timeout for HTTP checks
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Add an HTTP health check
    ///
    /// # Arguments
    ///
    /// * `service` - Name the gate knows the service by
    /// * `url` - Probe URL
    /// * `expect` - Substring the response body must contain
    pub fn with_http(
        mut self,
        service: impl Into<String>,
        url: impl Into<String>,
        expect: Option<impl Into<String>>,
    ) -> Self {
        self.pending.push((
            service.into(),
            PendingCheck::Http {
                url: url.into(),
                expect: expect.map(Into::into),
            },
        ));
        self
    }

    /// Add a MongoDB ping check
    pub fn with_mongo(mut self, service: impl Into<String>, client: mongodb::Client) -> Self {
        self.pending.push((service.into(), PendingCheck::Mongo(client)));
        self
    }

    /// Add a custom check
    pub fn with_check(mut self, service: impl Into<String>, check: Box<dyn HealthCheck>) -> Self {
        self.pending.push((service.into(), PendingCheck::Custom(check)));
        self
    }

    /// Build the ReadinessGate with all configured checks
    pub fn build(self) -> Result<ReadinessGate, ReadinessError> {
        let client = reqwest::Client::builder()
            .timeout(self.attempt_timeout)
            .build()
            .map_err(|e| ReadinessError::Client(e.to_string()))?;

        let mut gate = ReadinessGate::new();

        for (service, pending) in self.pending {
            let check: Box<dyn HealthCheck> = match pending {
                PendingCheck::Http { url, expect } => {
                    Box::new(HttpHealthCheck::new(client.clone(), url, expect))
                }
                PendingCheck::Mongo(mongo) => Box::new(MongoHealthCheck::new(mongo)),
                PendingCheck::Custom(check) => check,
            };
            gate.register(service, check);
        }

        Ok(gate)
    }
}

impl Default for ReadinessGateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
