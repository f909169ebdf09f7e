//! Bounded retry of channel operations.
//!
//! Only [`ChannelError`]s are retried: a framing, crypto or protocol error
//! means the peer answered and retrying would not change its answer.

use std::future::Future;
use std::time::Duration;

use crate::core::{ChannelError, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_RETRY_DELAY};

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }

    /// Maximum number of attempts.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `on_failure` observes every failed attempt except the last; the last
    /// error is returned instead.
    pub async fn run<T, F, Fut>(
        &self,
        mut op: F,
        mut on_failure: impl FnMut(&ChannelError, u32),
    ) -> Result<T, ChannelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChannelError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts => return Err(err),
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "channel operation failed, retrying");
                    on_failure(&err, attempt);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Blocking variant of [`run`](Self::run) for callers without a runtime.
    pub fn run_blocking<T>(
        &self,
        mut op: impl FnMut() -> Result<T, ChannelError>,
        mut on_failure: impl FnMut(&ChannelError, u32),
    ) -> Result<T, ChannelError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts => return Err(err),
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "channel operation failed, retrying");
                    on_failure(&err, attempt);
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}
