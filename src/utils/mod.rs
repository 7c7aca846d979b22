pub mod circuit_breaker;
pub mod rate_limiter;
pub mod resilience;
pub mod retry;

pub use circuit_breaker::CircuitBreakerConfig;
pub use rate_limiter::RateLimiterConfig;
pub use resilience::{ResilienceConfig, ResiliencePolicy};
pub use retry::{IsTransient, RetryConfig};
