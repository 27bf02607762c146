/// Fixed-interval polling bounded by a deadline
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two consecutive attempts
    pub interval: Duration,
    /// Overall ceiling measured from the first attempt
    pub deadline: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Value returned by a successful poll along with how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    #[error("Deadline of {deadline:?} exceeded after {attempts} attempts")]
    DeadlineExceeded {
        deadline: Duration,
        attempts: u32,
        /// Error of the last attempt that ran to completion, if any did
        last_error: Option<E>,
    },
}

impl<E> PollError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollError::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> Option<&E> {
        match self {
            PollError::DeadlineExceeded { last_error, .. } => last_error.as_ref(),
        }
    }
}

/// Run `probe` until it succeeds or `config.deadline` elapses.
///
/// Returns as soon as one attempt succeeds. A slow attempt is cut off at the
/// remaining deadline and the sleep between attempts never runs past it, so
/// the total time spent is bounded by `config.deadline`.
pub async fn poll_until_ready<F, Fut, T, E>(
    config: &PollConfig,
    mut probe: F,
) -> Result<Polled<T>, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let mut attempts = 0;
    let mut last_error = None;

    loop {
        let remaining = config.deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(PollError::DeadlineExceeded {
                deadline: config.deadline,
                attempts,
                last_error,
            });
        }

        attempts += 1;

        match timeout(remaining, probe()).await {
            Ok(Ok(value)) => {
                return Ok(Polled {
                    value,
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
            Ok(Err(e)) => {
                debug!(attempt = attempts, error = %e, "Probe not ready yet");
                last_error = Some(e);
            }
            Err(_) => {
                debug!(attempt = attempts, "Probe attempt cut off at deadline");
            }
        }

        let remaining = config.deadline.saturating_sub(started.elapsed());
        sleep(config.interval.min(remaining)).await;
    }
}
