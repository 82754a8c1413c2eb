//! Fixed-interval polling with an attempt ceiling and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ReportError;

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Pending,
}

/// Polling policy: wait `interval`, check, repeat at most `max_attempts` times.
///
/// No backoff; the interval is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before every check, including the first.
    pub interval: Duration,
    /// Maximum number of checks.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    /// Run `check` until it reports [`PollOutcome::Ready`], fails, or the
    /// attempt budget runs out.
    ///
    /// `check` receives the 1-based attempt number. Errors from `check` are
    /// returned immediately.
    pub async fn run<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut check: F,
    ) -> Result<T, ReportError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PollOutcome<T>, ReportError>>,
    {
        for attempt in 1..=self.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ReportError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }

            if let PollOutcome::Ready(value) = check(attempt).await? {
                return Ok(value);
            }
            tracing::trace!(attempt, max_attempts = self.max_attempts, "Still pending");
        }

        Err(ReportError::Timeout {
            attempts: self.max_attempts,
        })
    }
}
