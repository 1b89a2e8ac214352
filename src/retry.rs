//! Bounded retry with exponential backoff, used by `CredentialClient` for
//! transient connect failures to the external credential store. Never
//! retries indefinitely — a hung store must surface as a transport error
//! rather than hang a client session (SPEC_FULL §4.2).

use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::metrics::ServerMetrics;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl RetryConfig {
    pub fn for_credential_client(max_attempts: u32, connect_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(50),
            max_delay: connect_timeout,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Option<Arc<ServerMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, metrics: None }
    }

    pub fn with_metrics(config: RetryConfig, metrics: Arc<ServerMetrics>) -> Self {
        Self { config, metrics: Some(metrics) }
    }

    /// Runs `operation` up to `max_attempts` times, retrying only errors for
    /// which `is_retryable` returns true. Backs off exponentially, with
    /// jitter, between attempts.
    pub async fn execute<T, F, Fut, E>(
        &self,
        operation_name: &str,
        operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
    {
        let mut attempt = 1;
        let mut delay = self.config.initial_delay;

        loop {
            if let Some(metrics) = &self.metrics {
                metrics.increment_retry_attempts();
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(operation = operation_name, attempt, "succeeded after retry");
                        if let Some(metrics) = &self.metrics {
                            metrics.increment_retry_successes();
                        }
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= self.config.max_attempts || !is_retryable(&error) {
                        warn!(
                            operation = operation_name,
                            attempt,
                            max_attempts = self.config.max_attempts,
                            error = ?error,
                            "giving up"
                        );
                        return Err(error);
                    }

                    warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = ?error,
                        "retrying after delay"
                    );
                    sleep(delay).await;

                    let next = Duration::from_millis(
                        (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                    );
                    delay = std::cmp::min(next, self.config.max_delay);
                    if self.config.jitter_factor > 0.0 {
                        let jitter_ceiling = (delay.as_millis() as f64 * self.config.jitter_factor) as u64;
                        let jitter = rand::rng().random_range(0..=jitter_ceiling.max(1));
                        delay += Duration::from_millis(jitter);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn always_retryable(_: &&str) -> bool {
        true
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let executor = RetryExecutor::new(RetryConfig::for_credential_client(3, Duration::from_millis(100)));
        let result = executor.execute("test", || async { Ok::<i32, &str>(42) }, always_retryable).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(RetryConfig::for_credential_client(5, Duration::from_millis(50)));

        let counter_clone = counter.clone();
        let result = executor
            .execute(
                "test_retry",
                move || {
                    let counter = counter_clone.clone();
                    async move {
                        let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        if attempt < 3 {
                            Err("connection refused")
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                always_retryable,
            )
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let executor = RetryExecutor::new(RetryConfig::for_credential_client(2, Duration::from_millis(50)));
        let result = executor
            .execute("test_fail", || async { Err::<i32, &str>("connection refused") }, always_retryable)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(RetryConfig::for_credential_client(5, Duration::from_millis(50)));
        let counter_clone = counter.clone();
        let result = executor
            .execute(
                "test_non_retryable",
                move || {
                    counter_clone.fetch_add(1, Ordering::Relaxed);
                    async { Err::<i32, &str>("wrong credentials") }
                },
                |_| false,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
