// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded-attempt retry with exponential backoff for provider calls.
//!
//! Transient errors (429, 5xx, transport) are retried up to a configured
//! attempt count with exponentially growing, jittered delays. Permanent
//! errors fail immediately. The retryable classification comes from
//! [`ProviderError::is_retryable`].

use crate::constants::{RETRY_MAX_INTERVAL_SECS, RETRY_RANDOMIZATION_FACTOR};
use crate::errors::ProviderError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Retry configuration for a provider client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per operation, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Cap on the grown delay
    pub max_delay: Duration,
    /// Randomization factor applied to each delay (e.g. 0.1 for ±10%)
    pub randomization_factor: f64,
}

impl RetryPolicy {
    /// Policy with the standard cap and jitter.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(RETRY_MAX_INTERVAL_SECS),
            randomization_factor: RETRY_RANDOMIZATION_FACTOR,
        }
    }

    /// Delay to sleep after the given failed attempt (1-based).
    ///
    /// Attempt 1 waits `base_delay`, attempt 2 waits twice that, and so on,
    /// capped at `max_delay` and jittered by `randomization_factor`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let grown = self.base_delay.as_secs_f64() * 2f64.powi(exponent as i32);
        let capped = grown.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(apply_jitter(capped, self.randomization_factor))
    }
}

fn apply_jitter(secs: f64, factor: f64) -> f64 {
    if factor == 0.0 || secs == 0.0 {
        return secs;
    }
    let delta = secs * factor;
    rand::thread_rng().gen_range((secs - delta)..=(secs + delta)).max(0.0)
}

/// Run a provider operation with the policy's bounded-attempt retry.
///
/// # Errors
///
/// Returns the last error when a non-retryable error is encountered or all
/// attempts are exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "provider call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                error!(
                    operation = operation_name,
                    error = %e,
                    "non-retryable provider error, failing immediately"
                );
                return Err(e);
            }
            Err(e) if attempt >= policy.max_attempts => {
                error!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %e,
                    "retry attempts exhausted, giving up"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?delay,
                    error = %e,
                    "retryable provider error, will retry"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
