use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

// ============================================================================
// Rate Limiter
// ============================================================================
//
// Fixed-window permits: at most `limit_for_period` calls per
// `refresh_period`. A caller that finds the window exhausted waits for the
// next window if it opens within `timeout`, otherwise it is rejected.
//
// ============================================================================

/// Limits logical calls, not outbound requests: when the limiter guards a
/// `ResiliencePolicy`, every retry attempt of one call runs under the permit
/// that call acquired.
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    pub limit_for_period: u32,
    pub refresh_period: Duration,
    /// Longest a caller may wait for a permit
    pub timeout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_for_period: 10,
            refresh_period: Duration::from_secs(1),
            timeout: Duration::ZERO,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded, next permit in {0:?}")]
    Exceeded(Duration),
}

struct Window {
    started: Instant,
    used: u32,
}

pub struct RateLimiter {
    config: RateLimiterConfig,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Take one permit, waiting up to the configured timeout
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();

                if now.duration_since(window.started) >= self.config.refresh_period {
                    window.started = now;
                    window.used = 0;
                }

                if window.used < self.config.limit_for_period {
                    window.used += 1;
                    return Ok(());
                }

                self.config.refresh_period - now.duration_since(window.started)
            };

            if Instant::now() + wait > deadline {
                tracing::warn!(
                    retry_after_ms = wait.as_millis(),
                    limit = self.config.limit_for_period,
                    "Rate limit exceeded"
                );
                return Err(RateLimitError::Exceeded(wait));
            }

            tracing::debug!(wait_ms = wait.as_millis(), "Waiting for rate limit permit");
            sleep(wait).await;
        }
    }
}
