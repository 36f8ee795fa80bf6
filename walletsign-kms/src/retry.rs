//! Retrying of idempotent requests.

use std::{thread::sleep, time::Duration};

use log::warn;

use crate::Error;

/// The default number of attempts of a request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// The default delay before the first retry.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// How often and how patiently a failed request is repeated.
///
/// Only errors for which [`Error::is_retryable`] holds are retried.
/// The delay doubles after every retry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// The maximum number of attempts, including the first one.
    ///
    /// A value of `0` is treated as `1`.
    pub max_attempts: u32,
    /// The delay before the first retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a new [`RetryPolicy`].
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Creates a [`RetryPolicy`] that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Calls `request` until it succeeds, fails with a non-retryable error or the attempts are
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub fn run<T>(
        &self,
        operation: &str,
        mut request: impl FnMut() -> Result<T, Error>,
    ) -> Result<T, Error> {
        let max_attempts = self.max_attempts.max(1);
        let mut delay = self.backoff;
        let mut attempt = 1;

        loop {
            match request() {
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "Attempt {attempt} of {max_attempts} of {operation} failed, retrying in {} ms: {error}",
                        delay.as_millis()
                    );
                    sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}
