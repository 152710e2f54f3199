use crate::CircuitState;

use metrics::{counter, gauge, histogram};

/// Metrics collector for forward-auth checks, webhooks and the breaker
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            prefix: "shadowgate",
        }
    }

    /// Record a forward-auth decision (allow, reject, degrade)
    pub fn forward_auth_decision(&self, outcome: &str) {
        counter!(format!("{}.forward_auth.checks", self.prefix)).increment(1);
        counter!(format!("{}.forward_auth.{}", self.prefix, outcome)).increment(1);
    }

    /// Record end-to-end latency of a forward-auth check
    pub fn forward_auth_latency(&self, duration: std::time::Duration) {
        histogram!(format!("{}.forward_auth.latency_ms", self.prefix))
            .record(duration.as_millis() as f64);
    }

    /// Record a processed webhook by outcome
    pub fn webhook_outcome(&self, outcome: &str) {
        counter!(format!("{}.webhooks.received", self.prefix)).increment(1);
        counter!(format!("{}.webhooks.{}", self.prefix, outcome)).increment(1);
    }

    /// Record a webhook refused before processing (signature, malformed)
    pub fn webhook_rejected(&self, reason: &str) {
        counter!(format!("{}.webhooks.rejected.{}", self.prefix, reason)).increment(1);
    }

    /// Record a breaker state change
    pub fn breaker_transition(&self, breaker: &str, to: CircuitState) {
        counter!(format!(
            "{}.breaker.{}.transitions.{}",
            self.prefix,
            breaker,
            to.as_str()
        ))
        .increment(1);
        gauge!(format!("{}.breaker.{}.state", self.prefix, breaker)).set(to.gauge_value());
        gauge!(format!("{}.breaker.{}.open", self.prefix, breaker)).set(
            if to == CircuitState::Open { 1.0 } else { 0.0 },
        );
    }

    /// Record a call refused by an open breaker
    pub fn breaker_rejected(&self, breaker: &str) {
        counter!(format!("{}.breaker.{}.rejected", self.prefix, breaker)).increment(1);
    }

    /// Record a shadow store failure
    pub fn store_error(&self, operation: &str) {
        counter!(format!("{}.store.errors", self.prefix)).increment(1);
        counter!(format!("{}.store.errors.{}", self.prefix, operation)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
