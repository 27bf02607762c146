/// Resilience helpers for probing services that are still coming up
///
/// This library provides:
/// - **Polling**: fixed-interval readiness polling bounded by an overall deadline
/// - **Timeout**: time limits on single external calls (HTTP, process spawns, queries)
///
/// # Example: Wait for a service with a 2s interval and a 60s ceiling
///
/// ```rust,no_run
/// use resilience::{poll_until_ready, PollConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = PollConfig::new(Duration::from_secs(2), Duration::from_secs(60));
///
///     let result = poll_until_ready(&config, || async {
///         // Your readiness probe here
///         Ok::<_, String>(())
///     })
///     .await;
/// }
/// ```
///
/// # Example: Bound a single call
///
/// ```rust,no_run
/// use resilience::with_timeout;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_timeout("docker info", Duration::from_secs(30), async {
///         // Your external call
///     })
///     .await;
/// }
/// ```

pub mod poll;
pub mod timeout;

pub use poll::{poll_until_ready, PollConfig, PollError, Polled};
pub use timeout::{with_timeout, TimeoutError};
