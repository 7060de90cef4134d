// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{with_retry, RetryPolicy};
    use crate::errors::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Policy with jitter disabled so delays are deterministic
    fn flat_policy(max_attempts: u32, base_millis: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(base_millis),
            max_delay: Duration::from_millis(base_millis * 4),
            randomization_factor: 0.0,
        }
    }

    #[test]
    fn test_delay_grows_exponentially_until_capped() {
        let policy = flat_policy(10, 100);

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        // Capped at max_delay from here on
        assert_eq!(policy.delay_for(4), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            randomization_factor: 0.1,
        };

        for _ in 0..100 {
            let delay = policy.delay_for(1).as_secs_f64();
            assert!(
                (4.5..=5.5).contains(&delay),
                "jittered delay {delay} outside ±10% of 5s"
            );
        }
    }

    #[test]
    fn test_zero_attempts_clamps_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&flat_policy(3, 1), "noop", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&flat_policy(3, 1), "flaky", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(ProviderError::Unavailable { status: 503 })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3, "two retries expected");
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&flat_policy(3, 1), "always-down", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::RateLimited) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "operation must stop at max_attempts"
        );
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&flat_policy(3, 1), "forbidden", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::Auth {
                    status: 403,
                    message: "token lacks zone scope".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "permanent errors must not be retried"
        );
    }
}
