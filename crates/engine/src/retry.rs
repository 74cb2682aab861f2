//! Fetch-retry discipline shared by the builder and the linker.
//!
//! Every source call is wrapped in [`RetryPolicy::run`]. Retryable errors
//! (transient failures and rate limits) are repeated with exponential
//! backoff; anything else returns at once so the calling phase can skip
//! its unit of work.

use std::thread;
use std::time::Duration;

use threadgraph_core::{FetchError, FetchResult, RetryConfig};

/// Retry and cool-down behaviour for source calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            cooldown: config.cooldown(),
        }
    }

    /// Policy that retries up to `max_attempts` times without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::from_config(&RetryConfig::immediate(max_attempts))
    }

    /// Attempts per call, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `f`, retrying retryable failures.
    ///
    /// `op` names the call in diagnostics.
    pub fn run<T, F>(&self, op: &str, mut f: F) -> FetchResult<T>
    where
        F: FnMut() -> FetchResult<T>,
    {
        let mut delay = self.initial_backoff;
        let mut attempt = 1;
        loop {
            let err = match f() {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            let wait = match &err {
                FetchError::ResourceExhausted { retry_after, .. } => {
                    retry_after.unwrap_or(self.cooldown)
                }
                _ => delay,
            };
            tracing::debug!(
                target: "threadgraph::retry",
                op,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "Retrying source call"
            );
            sleep(wait);

            delay = (delay * 2).min(self.max_backoff);
            attempt += 1;
        }
    }

    /// Pause after a failed unit of work.
    pub fn cool_down(&self) {
        if !self.cooldown.is_zero() {
            tracing::debug!(
                target: "threadgraph::retry",
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Cooling down after failure"
            );
        }
        sleep(self.cooldown);
    }
}

fn sleep(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}
