//! Health check implementations for external dependencies

use crate::error::{HealthCheckError, Result};
use async_trait::async_trait;
use mongodb::bson::doc;

/// Trait for health check implementations
///
/// Implement this trait to create custom health checks for your dependencies.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Perform the health check
    ///
    /// Returns `Ok(())` if the dependency can accept traffic, or an error describing the problem.
    async fn check(&self) -> Result<()>;
}

/// HTTP health check
///
/// Passes when a GET on `url` answers 2xx and, if configured, the body
/// contains the expected substring.
pub struct HttpHealthCheck {
    client: reqwest::Client,
    url: String,
    expect: Option<String>,
}

impl HttpHealthCheck {
    /// Create a new HTTP health check
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client; its timeout bounds each attempt
    /// * `url` - Full probe URL (e.g. "http://localhost:8000/health")
    /// * `expect` - Substring the response body must contain
    pub fn new(client: reqwest::Client, url: impl Into<String>, expect: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            expect,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HealthCheckError::http(format!("GET {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthCheckError::http(format!(
                "GET {} returned {}",
                self.url, status
            )));
        }

        if let Some(expected) = &self.expect {
            let body = response.text().await.map_err(|e| {
                HealthCheckError::http(format!("Failed to read body from {}: {}", self.url, e))
            })?;

            if !body.contains(expected.as_str()) {
                return Err(HealthCheckError::http(format!(
                    "GET {} body does not contain '{}'",
                    self.url, expected
                )));
            }
        }

        Ok(())
    }
}

/// MongoDB health check
///
/// Verifies the server answers the `ping` admin command.
pub struct MongoHealthCheck {
    client: mongodb::Client,
}

impl MongoHealthCheck {
    /// Create a new MongoDB health check
    pub fn new(client: mongodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthCheck for MongoHealthCheck {
    async fn check(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| HealthCheckError::datastore(format!("Failed to ping MongoDB: {}", e)))?;

        Ok(())
    }
}
