use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::utils::{CircuitBreakerConfig, RateLimiterConfig, ResilienceConfig, RetryConfig};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub department_service_url: String,
    pub department_timeout: Duration,
    pub department_resilience: ResilienceConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let department_service_url =
            lookup("DEPARTMENT_SERVICE_URL").unwrap_or_else(|| "http://localhost:8081".to_string());

        let retry = RetryConfig {
            max_attempts: parse_or(&lookup, "DEPARTMENT_RETRY_MAX_ATTEMPTS", 3)?,
            initial_delay: Duration::from_millis(parse_or(&lookup, "DEPARTMENT_RETRY_INITIAL_DELAY_MS", 100)?),
            ..RetryConfig::default()
        };

        let circuit_breaker = CircuitBreakerConfig {
            failure_rate_threshold: parse_or(&lookup, "DEPARTMENT_CB_FAILURE_RATE", 50.0)?,
            sliding_window_size: parse_or(&lookup, "DEPARTMENT_CB_WINDOW_SIZE", 10)?,
            timeout: Duration::from_secs(parse_or(&lookup, "DEPARTMENT_CB_OPEN_SECS", 10)?),
            ..CircuitBreakerConfig::default()
        };

        let rate_limiter = RateLimiterConfig {
            limit_for_period: parse_or(&lookup, "DEPARTMENT_RATE_LIMIT", 10)?,
            refresh_period: Duration::from_millis(parse_or(&lookup, "DEPARTMENT_RATE_PERIOD_MS", 1000)?),
            ..RateLimiterConfig::default()
        };

        if retry.max_attempts == 0 {
            anyhow::bail!("DEPARTMENT_RETRY_MAX_ATTEMPTS must be at least 1");
        }
        if !(0.0..=100.0).contains(&circuit_breaker.failure_rate_threshold) {
            anyhow::bail!("DEPARTMENT_CB_FAILURE_RATE must be a percentage between 0 and 100");
        }

        Ok(Self {
            http_addr,
            department_service_url,
            department_timeout: Duration::from_secs(5),
            department_resilience: ResilienceConfig {
                rate_limiter,
                retry,
                circuit_breaker: CircuitBreakerConfig {
                    minimum_calls: circuit_breaker.minimum_calls.min(circuit_breaker.sliding_window_size),
                    ..circuit_breaker
                },
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.department_service_url, "http://localhost:8081");
        assert_eq!(config.department_resilience.retry.max_attempts, 3);
        assert_eq!(config.department_resilience.retry.initial_delay, Duration::from_millis(100));
        assert_eq!(config.department_resilience.circuit_breaker.failure_rate_threshold, 50.0);
        assert_eq!(config.department_resilience.circuit_breaker.sliding_window_size, 10);
        assert_eq!(config.department_resilience.circuit_breaker.timeout, Duration::from_secs(10));
        assert_eq!(config.department_resilience.rate_limiter.limit_for_period, 10);
        assert_eq!(config.department_resilience.rate_limiter.refresh_period, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DEPARTMENT_RETRY_MAX_ATTEMPTS", "5"),
            ("DEPARTMENT_CB_WINDOW_SIZE", "3"),
            ("DEPARTMENT_RATE_LIMIT", "2"),
        ])
        .unwrap();

        assert_eq!(config.http_addr, "127.0.0.1:9000");
        assert_eq!(config.department_resilience.retry.max_attempts, 5);
        assert_eq!(config.department_resilience.rate_limiter.limit_for_period, 2);
        // minimum_calls never exceeds the window
        assert_eq!(config.department_resilience.circuit_breaker.minimum_calls, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("DEPARTMENT_RATE_LIMIT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("DEPARTMENT_RATE_LIMIT"));

        assert!(config_from(&[("DEPARTMENT_RETRY_MAX_ATTEMPTS", "0")]).is_err());
        assert!(config_from(&[("DEPARTMENT_CB_FAILURE_RATE", "150")]).is_err());
    }
}
