// Private module declaration
mod server;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Command handling outcomes on the write side
// - Projection throughput and dropped status updates on the read side
// - Retry attempts, circuit breaker state, rate limiting and fallbacks
//   around the department service
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Write side
    pub commands_handled: IntCounterVec,

    // Read side
    pub events_projected: IntCounterVec,
    pub projection_missing_rows: IntCounter,

    // Retry Metrics
    pub retry_attempts_total: IntCounterVec,

    // Circuit Breaker Metrics
    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,

    // Rate limiting and fallbacks
    pub rate_limit_rejections: IntCounterVec,
    pub fallbacks_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_handled = IntCounterVec::new(
            Opts::new("commands_handled_total", "Enrollment commands handled"),
            &["command", "outcome"],
        )?;
        registry.register(Box::new(commands_handled.clone()))?;

        let events_projected = IntCounterVec::new(
            Opts::new("events_projected_total", "Events folded into the read model"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_projected.clone()))?;

        let projection_missing_rows = IntCounter::new(
            "projection_missing_rows_total",
            "Status updates dropped because the read-model row did not exist",
        )?;
        registry.register(Box::new(projection_missing_rows.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        let rate_limit_rejections = IntCounterVec::new(
            Opts::new("rate_limit_rejections_total", "Calls rejected by the rate limiter"),
            &["operation"],
        )?;
        registry.register(Box::new(rate_limit_rejections.clone()))?;

        let fallbacks_total = IntCounterVec::new(
            Opts::new("fallbacks_total", "Fallback responses served instead of dependency results"),
            &["operation"],
        )?;
        registry.register(Box::new(fallbacks_total.clone()))?;

        Ok(Self {
            registry,
            commands_handled,
            events_projected,
            projection_missing_rows,
            retry_attempts_total,
            circuit_breaker_state,
            circuit_breaker_transitions,
            rate_limit_rejections,
            fallbacks_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_command(&self, command: &str, outcome: &str) {
        self.commands_handled.with_label_values(&[command, outcome]).inc();
    }

    pub fn record_projected_event(&self, event_type: &str) {
        self.events_projected.with_label_values(&[event_type]).inc();
    }

    pub fn record_missing_row(&self) {
        self.projection_missing_rows.inc();
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total
            .with_label_values(&[operation, &attempt.to_string()])
            .inc();
    }

    /// Helper to update circuit breaker state
    pub fn update_circuit_breaker_state(&self, state: u8) {
        self.circuit_breaker_state.set(i64::from(state));
    }

    /// Helper to record circuit breaker transition
    pub fn record_circuit_breaker_transition(&self, from_state: &str, to_state: &str) {
        self.circuit_breaker_transitions
            .with_label_values(&[from_state, to_state])
            .inc();
    }

    pub fn record_rate_limit_rejection(&self, operation: &str) {
        self.rate_limit_rejections.with_label_values(&[operation]).inc();
    }

    pub fn record_fallback(&self, operation: &str) {
        self.fallbacks_total.with_label_values(&[operation]).inc();
    }
}
