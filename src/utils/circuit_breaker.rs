use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::metrics::Metrics;
use super::retry::IsTransient;

// ============================================================================
// Circuit Breaker Pattern Implementation
// ============================================================================
//
// Tracks the outcome of recent calls and short-circuits new calls while the
// dependency is unhealthy.
//
// States:
// - Closed: Normal operation, outcomes go into a sliding window
// - Open: Failure rate crossed the threshold, calls rejected immediately
// - HalfOpen: Open interval elapsed, a bounded number of trial calls decide
//   whether to close
//
// Admission is decided before the operation is created, so a rejected call
// never touches the dependency.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding used by the metrics module
    pub fn as_gauge(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Failure percentage (0-100) of the sliding window that opens the circuit
    pub failure_rate_threshold: f64,
    /// Number of most recent calls considered
    pub sliding_window_size: usize,
    /// Calls required in the window before the rate is evaluated
    pub minimum_calls: usize,
    /// How long the circuit stays open before allowing a trial
    pub timeout: Duration,
    /// Successful trials needed to close the circuit from half-open
    pub success_threshold: u32,
    /// Trial calls allowed in flight at once while half-open
    pub permitted_calls_in_half_open: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 10,
            minimum_calls: 5,
            timeout: Duration::from_secs(10),
            success_threshold: 2,
            permitted_calls_in_half_open: 1,
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<CircuitBreakerState>>,
    config: CircuitBreakerConfig,
    metrics: Option<Arc<Metrics>>,
}

struct CircuitBreakerState {
    state: CircuitState,
    // true = success
    outcomes: VecDeque<bool>,
    success_count: u32,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
    // Bumped on every entry into HalfOpen so late trials from an earlier
    // half-open period are not counted against the current one
    half_open_generation: u64,
}

impl CircuitBreakerState {
    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|ok| !**ok).count();
        failures as f64 * 100.0 / self.outcomes.len() as f64
    }

    fn is_current_trial(&self, trial: Option<u64>) -> bool {
        self.state == CircuitState::HalfOpen && trial == Some(self.half_open_generation)
    }
}

/// Admission for one call. Report the outcome with `complete`; dropping it
/// unfinished frees its half-open slot without recording anything.
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: Option<u64>,
    completed: bool,
}

impl CallPermit<'_> {
    pub fn complete<T, E>(mut self, result: Result<T, E>) -> Result<T, CircuitBreakerError<E>> {
        self.completed = true;
        match result {
            Ok(value) => {
                self.breaker.record_outcome(self.trial, true);
                Ok(value)
            }
            Err(err) => {
                self.breaker.record_outcome(self.trial, false);
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            let mut state = self.breaker.lock();
            if state.is_current_trial(self.trial) {
                state.trials_in_flight = state.trials_in_flight.saturating_sub(1);
            }
        }
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CircuitBreakerState {
                state: CircuitState::Closed,
                outcomes: VecDeque::with_capacity(config.sliding_window_size),
                success_count: 0,
                opened_at: None,
                trials_in_flight: 0,
                half_open_generation: 0,
            })),
            config,
            metrics: None,
        }
    }

    /// Report state transitions to Prometheus
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.update_circuit_breaker_state(CircuitState::Closed.as_gauge());
        self.metrics = Some(metrics);
        self
    }

    fn lock(&self) -> MutexGuard<'_, CircuitBreakerState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Ask to make one call. `None` while open, or while half-open with
    /// every trial slot taken.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut state = self.lock();

        if state.state == CircuitState::Open {
            let elapsed = state.opened_at.map_or(Duration::MAX, |at| at.elapsed());
            if elapsed < self.config.timeout {
                return None;
            }
            self.transition(&mut state, CircuitState::HalfOpen);
            state.success_count = 0;
            state.trials_in_flight = 0;
            state.half_open_generation += 1;
        }

        let trial = match state.state {
            CircuitState::HalfOpen => {
                if state.trials_in_flight >= self.config.permitted_calls_in_half_open {
                    tracing::debug!(
                        in_flight = state.trials_in_flight,
                        "Half-open trial budget exhausted, rejecting call"
                    );
                    return None;
                }
                state.trials_in_flight += 1;
                Some(state.half_open_generation)
            }
            _ => None,
        };

        Some(CallPermit {
            breaker: self,
            trial,
            completed: false,
        })
    }

    /// Execute an operation with circuit breaker protection. `operation` is
    /// only invoked once the call has been admitted.
    #[cfg(test)]
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            return Err(CircuitBreakerError::CircuitOpen);
        };
        permit.complete(operation().await)
    }

    fn record_outcome(&self, trial: Option<u64>, success: bool) {
        let mut state = self.lock();
        let current_trial = state.is_current_trial(trial);
        if current_trial {
            state.trials_in_flight = state.trials_in_flight.saturating_sub(1);
        }

        match state.state {
            CircuitState::Closed => {
                self.push_outcome(&mut state, success);

                let rate = state.failure_rate();
                if !success
                    && state.outcomes.len() >= self.config.minimum_calls
                    && rate >= self.config.failure_rate_threshold
                {
                    tracing::warn!(
                        failure_rate = rate,
                        window = state.outcomes.len(),
                        "Circuit breaker opening"
                    );
                    self.transition(&mut state, CircuitState::Open);
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen if current_trial => {
                if success {
                    state.success_count += 1;
                    if state.success_count >= self.config.success_threshold {
                        self.transition(&mut state, CircuitState::Closed);
                        state.outcomes.clear();
                        state.success_count = 0;
                        state.opened_at = None;
                    }
                } else {
                    tracing::warn!("Failure during half-open, reopening circuit");
                    self.transition(&mut state, CircuitState::Open);
                    state.opened_at = Some(Instant::now());
                    state.success_count = 0;
                }
            }
            _ => {
                // A call admitted before the circuit last changed state
                tracing::debug!(success, "Ignoring outcome of a call from an earlier circuit state");
            }
        }
    }

    fn push_outcome(&self, state: &mut CircuitBreakerState, success: bool) {
        state.outcomes.push_back(success);
        while state.outcomes.len() > self.config.sliding_window_size {
            state.outcomes.pop_front();
        }
    }

    fn transition(&self, state: &mut CircuitBreakerState, to: CircuitState) {
        let from = state.state;
        if from == to {
            return;
        }

        tracing::info!(
            from = from.name(),
            to = to.name(),
            "Circuit breaker state change"
        );
        state.state = to;

        if let Some(metrics) = &self.metrics {
            metrics.record_circuit_breaker_transition(from.name(), to.name());
            metrics.update_circuit_breaker_state(to.as_gauge());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "Circuit breaker is open"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for CircuitBreakerError<E> {}

// An open circuit will still be open on the next attempt
impl<E: IsTransient> IsTransient for CircuitBreakerError<E> {
    fn is_transient(&self) -> bool {
        match self {
            CircuitBreakerError::CircuitOpen => false,
            CircuitBreakerError::OperationFailed(e) => e.is_transient(),
        }
    }
}
