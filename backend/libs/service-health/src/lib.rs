//! # Service Health Library
//!
//! Readiness probes for the services a deployment depends on, and a gate
//! that waits for each of them to come up.
//!
//! ## Features
//!
//! - `HealthCheck` trait for custom probes
//! - HTTP probe (status plus optional body substring)
//! - MongoDB probe (`ping` admin command)
//! - `ReadinessGate` that polls a named service at a fixed interval until a deadline
//!
//! ## Example
//!
//! ```ignore
//! use resilience::PollConfig;
//! use service_health::ReadinessGateBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mongo = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
//!
//! let gate = ReadinessGateBuilder::new()
//!     .with_mongo("mongodb", mongo)
//!     .with_http("backend", "http://localhost:8000/health", Some("healthy"))
//!     .build()?;
//!
//! let poll = PollConfig::new(Duration::from_secs(2), Duration::from_secs(60));
//! gate.wait_for("mongodb", &poll).await?;
//! gate.wait_for("backend", &poll).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod checks;
mod error;
mod health;
mod manager;

pub use builder::ReadinessGateBuilder;
pub use checks::{HealthCheck, HttpHealthCheck, MongoHealthCheck};
pub use error::{HealthCheckError, ReadinessError, Result};
pub use health::HealthStatus;
pub use manager::ReadinessGate;
