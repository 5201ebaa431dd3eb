//! Bounded exponential backoff around any fallible async operation.
//!
//! The strategy knows nothing about what it wraps: HTTP calls, parses, or
//! anything else that can fail transiently. Success is transparent; after
//! the last attempt the original error goes back to the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RetryStrategy {
    max_attempts: u32,
    base_delay: f64,
    max_delay: f64,
    backoff_factor: f64,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3, 5.0, 60.0, 2.0)
    }
}

impl RetryStrategy {
    pub fn new(max_attempts: u32, base_delay: f64, max_delay: f64, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_factor,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Nominal backoff for a zero-indexed attempt, before jitter:
    /// `min(base_delay * backoff_factor^attempt, max_delay)`.
    pub fn backoff_delay(&self, attempt: u32) -> f64 {
        (self.base_delay * self.backoff_factor.powi(attempt as i32)).min(self.max_delay)
    }

    /// Run `operation` until it succeeds or `max_attempts` is exhausted,
    /// sleeping the backoff delay plus up to 20% jitter between attempts.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("attempt {}/{} failed: {e}", attempt + 1, self.max_attempts);
                    last_error = Some(e);
                    if attempt + 1 < self.max_attempts {
                        let nominal = self.backoff_delay(attempt);
                        let delay = nominal + rand::thread_rng().gen_range(0.0..=nominal * 0.2);
                        info!("retrying in {delay:.2}s");
                        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    }
                }
            }
        }
        error!("all {} attempts failed", self.max_attempts);
        Err(last_error.expect("at least one attempt was made"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn success_passes_through_on_first_attempt() {
        let strategy = RetryStrategy::default();
        let result: Result<u32, String> = strategy.execute(|| async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn failing_operation_is_attempted_exactly_max_times() {
        let strategy = RetryStrategy::new(3, 0.001, 0.002, 2.0);
        let attempts = AtomicU32::new(0);
        let result: Result<(), String> = strategy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("boom".to_string()) }
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[tokio::test]
    async fn recovers_when_a_later_attempt_succeeds() {
        let strategy = RetryStrategy::new(3, 0.001, 0.002, 2.0);
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = strategy
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("not yet".to_string())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let strategy = RetryStrategy::new(5, 5.0, 60.0, 2.0);
        assert_eq!(strategy.backoff_delay(0), 5.0);
        assert_eq!(strategy.backoff_delay(1), 10.0);
        assert_eq!(strategy.backoff_delay(2), 20.0);
        assert_eq!(strategy.backoff_delay(4), 60.0);
    }

    #[test]
    fn at_least_one_attempt_is_enforced() {
        let strategy = RetryStrategy::new(0, 1.0, 1.0, 1.0);
        assert_eq!(strategy.max_attempts(), 1);
    }
}
