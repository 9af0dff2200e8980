//! Retry policy for transient failures.

use crate::errors::{MotiveError, MotiveResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retries an operation with a fixed delay between attempts.
///
/// Only errors for which [`MotiveError::is_retryable`] holds are retried. When
/// attempts run out, the last error is returned as-is.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    max_attempts: u32,
    delay: Duration,
}

impl RetryExecutor {
    /// Creates a new retry executor. `max_attempts` counts the first try.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Total attempts per call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Executes an operation with retry logic.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> MotiveResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = MotiveResult<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error: MotiveError = match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.max_attempts {
                return Err(error);
            }

            tracing::debug!(
                attempt = attempt,
                max_attempts = self.max_attempts,
                delay_ms = self.delay.as_millis() as u64,
                error = %error,
                "Retrying after transient error"
            );

            sleep(self.delay).await;
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}
