/// Time limit for a single external call
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("{label} timed out after {after:?}")]
    Elapsed { label: String, after: Duration },
}

/// Execute a future with a time limit. `label` names the call in the error.
pub async fn with_timeout<F, T>(
    label: impl Into<String>,
    limit: Duration,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| TimeoutError::Elapsed {
            label: label.into(),
            after: limit,
        })
}
