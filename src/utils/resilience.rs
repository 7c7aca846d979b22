use std::future::Future;
use std::sync::Arc;

use crate::metrics::Metrics;
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use super::rate_limiter::{RateLimitError, RateLimiter, RateLimiterConfig};
use super::retry::{retry_on_transient, IsTransient, RetryConfig, RetryResult};

// ============================================================================
// Resilience Policy - guards a call to an external dependency
// ============================================================================
//
// Fixed composition, outermost first:
//
//   rate limit → retry → circuit breaker → operation
//
// Each retry attempt passes through the circuit breaker, so retries count
// towards its failure rate. An open circuit ends the retry loop at once.
// Whatever still fails is handed to the caller's fallback.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResilienceError<E> {
    #[error("{0}")]
    RateLimited(#[from] RateLimitError),

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Dependency call failed: {0}")]
    Failed(E),
}

#[derive(Clone, Debug, Default)]
pub struct ResilienceConfig {
    pub rate_limiter: RateLimiterConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

pub struct ResiliencePolicy {
    name: String,
    rate_limiter: RateLimiter,
    retry: RetryConfig,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl ResiliencePolicy {
    pub fn new(name: &str, config: ResilienceConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            name: name.to_string(),
            rate_limiter: RateLimiter::new(config.rate_limiter),
            retry: config.retry,
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker).with_metrics(metrics.clone()),
            metrics,
        }
    }

    /// Run `operation` under rate limiting, retry and circuit breaking.
    ///
    /// One rate-limit permit covers the whole logical call, retries included.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display + IsTransient,
    {
        if let Err(e) = self.rate_limiter.acquire().await {
            self.metrics.record_rate_limit_rejection(&self.name);
            return Err(e.into());
        }

        let breaker = &self.circuit_breaker;
        let metrics = &self.metrics;
        let name = self.name.as_str();

        let outcome = retry_on_transient(self.retry.clone(), move |attempt| {
            metrics.record_retry_attempt(name, attempt);
            // The operation is only created once the breaker admits the call
            let admitted = breaker.try_acquire().map(|permit| (permit, operation()));
            async move {
                match admitted {
                    Some((permit, call)) => permit.complete(call.await),
                    None => Err(CircuitBreakerError::CircuitOpen),
                }
            }
        })
        .await;

        match outcome {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed(CircuitBreakerError::CircuitOpen)
            | RetryResult::PermanentFailure(CircuitBreakerError::CircuitOpen) => {
                Err(ResilienceError::CircuitOpen)
            }
            RetryResult::Failed(CircuitBreakerError::OperationFailed(e))
            | RetryResult::PermanentFailure(CircuitBreakerError::OperationFailed(e)) => {
                Err(ResilienceError::Failed(e))
            }
        }
    }

    /// Like `execute`, but every failure is converted by `fallback`
    pub async fn execute_or_else<F, Fut, T, E, FB>(&self, operation: F, fallback: FB) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display + IsTransient,
        FB: FnOnce(ResilienceError<E>) -> T,
    {
        match self.execute(operation).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    operation = %self.name,
                    error = %e,
                    circuit = self.circuit_breaker.state().name(),
                    "Fallback triggered, dependency unavailable"
                );
                self.metrics.record_fallback(&self.name);
                fallback(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::circuit_breaker::CircuitState;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Flaky;

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky dependency")
        }
    }

    impl IsTransient for Flaky {
        fn is_transient(&self) -> bool {
            true
        }
    }

    fn test_config() -> ResilienceConfig {
        ResilienceConfig {
            rate_limiter: RateLimiterConfig {
                limit_for_period: 100,
                refresh_period: Duration::from_secs(1),
                timeout: Duration::ZERO,
            },
            retry: RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
                multiplier: 2.0,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_rate_threshold: 50.0,
                sliding_window_size: 6,
                minimum_calls: 6,
                timeout: Duration::from_secs(30),
                success_threshold: 1,
                permitted_calls_in_half_open: 1,
            },
        }
    }

    fn policy(config: ResilienceConfig) -> (ResiliencePolicy, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        (ResiliencePolicy::new("test_call", config, metrics.clone()), metrics)
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (policy, _) = policy(test_config());
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(Flaky) } else { Ok(n) } }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_reach_fallback() {
        let (policy, metrics) = policy(test_config());
        let calls = AtomicU32::new(0);

        let value = policy
            .execute_or_else(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<&str, _>(Flaky) }
                },
                |e| {
                    assert!(matches!(e, ResilienceError::Failed(Flaky)));
                    "fallback"
                },
            )
            .await;

        assert_eq!(value, "fallback");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.fallbacks_total.with_label_values(&["test_call"]).get(), 1);
    }

    #[tokio::test]
    async fn test_open_circuit_short_circuits_without_calling() {
        let (policy, _) = policy(test_config());
        let calls = AtomicU32::new(0);
        let failing = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Flaky) }
        };

        // Two exhausted executions = 6 failed calls, circuit opens
        let _ = policy.execute(failing).await;
        let _ = policy.execute(failing).await;
        assert_eq!(policy.circuit_breaker.state(), CircuitState::Open);
        assert_eq!(calls.load(Ordering::SeqCst), 6);

        let result = policy.execute(failing).await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_before_calling() {
        let mut config = test_config();
        config.rate_limiter.limit_for_period = 1;
        config.rate_limiter.refresh_period = Duration::from_secs(60);
        let (policy, metrics) = policy(config);
        let calls = AtomicU32::new(0);
        let ok = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Flaky>(()) }
        };

        assert!(policy.execute(ok).await.is_ok());
        let second = policy.execute(ok).await;

        assert!(matches!(second, Err(ResilienceError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            metrics.rate_limit_rejections.with_label_values(&["test_call"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_retries_share_the_call_permit() {
        let mut config = test_config();
        config.rate_limiter.limit_for_period = 1;
        config.rate_limiter.refresh_period = Duration::from_secs(60);
        let (policy, _) = policy(config);
        let calls = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(Flaky) } else { Ok(n) } }
            })
            .await;

        // Three outbound attempts under a single permit
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            policy.execute(|| async { Ok::<_, Flaky>(0) }).await,
            Err(ResilienceError::RateLimited(_))
        ));
    }
}
