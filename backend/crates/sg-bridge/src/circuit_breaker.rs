use crate::Metrics;

use std::future::Future;
use std::panic::Location;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

// Defaults for the downstream session check:
// - Open after 5 failures within 60 seconds (failure_threshold/failure_window)
// - Stay open for 30 seconds before a single trial call (reset_timeout)
// - Give each call 3 seconds (call_timeout)
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RESET_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FAILURE_WINDOW_SECS: u64 = 60;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 3;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - calls flow through
    Closed,
    /// Too many failures - calls rejected immediately
    Open,
    /// Cooldown elapsed - one trial call decides
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    /// Numeric form for the state gauge: 0 closed, 1 half-open, 2 open.
    pub fn gauge_value(&self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::HalfOpen => 1.0,
            Self::Open => 2.0,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening circuit
    pub failure_threshold: u32,
    /// Time to stay open before allowing a trial call
    pub reset_timeout: Duration,
    /// Failures further apart than this restart the count
    pub failure_window: Duration,
    /// Deadline applied to every call made through [`CircuitBreaker::call`]
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: Duration::from_secs(DEFAULT_RESET_TIMEOUT_SECS),
            failure_window: Duration::from_secs(DEFAULT_FAILURE_WINDOW_SECS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

#[derive(Error, Debug)]
pub enum BreakerError<E> {
    #[error("Circuit breaker open, retry after {}s {location}", retry_after.as_secs())]
    Open {
        retry_after: Duration,
        location: ErrorLocation,
    },

    #[error("Call timed out after {}ms {location}", after.as_millis())]
    Timeout {
        after: Duration,
        location: ErrorLocation,
    },

    #[error("{0}")]
    Inner(E),
}

/// Point-in-time view of a breaker, for health output.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub threshold: u32,
    pub reset_timeout_secs: u64,
    pub last_transition_at: DateTime<Utc>,
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    window_started_at: Option<Instant>,
    last_transition_at: Instant,
    last_transition_wall: DateTime<Utc>,
    probe_in_flight: bool,
}

/// Thread-safe circuit breaker around one dependency.
///
/// Every state change happens under `state`. In HalfOpen exactly one
/// caller holds the trial permit; everyone else is refused until it settles.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
    metrics: Metrics,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                window_started_at: None,
                last_transition_at: Instant::now(),
                last_transition_wall: Utc::now(),
                probe_in_flight: false,
            }),
            metrics: Metrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask to make one call. The returned permit must be settled with
    /// [`CallPermit::success`] or [`CallPermit::failure`]; dropping it
    /// unsettled counts as a failure.
    #[track_caller]
    pub fn try_acquire<E>(&self) -> Result<CallPermit<'_>, BreakerError<E>> {
        self.acquire_at(Location::caller())
    }

    fn acquire_at<E>(
        &self,
        caller: &'static Location<'static>,
    ) -> Result<CallPermit<'_>, BreakerError<E>> {
        let mut guard = self.lock();
        let now = Instant::now();

        match guard.state {
            CircuitState::Closed => Ok(CallPermit::new(self, false)),
            CircuitState::Open => {
                let elapsed = now.saturating_duration_since(guard.last_transition_at);
                if elapsed >= self.config.reset_timeout {
                    self.transition(&mut guard, CircuitState::HalfOpen, now);
                    guard.probe_in_flight = true;
                    Ok(CallPermit::new(self, true))
                } else {
                    self.metrics.breaker_rejected(&self.name);
                    Err(BreakerError::Open {
                        retry_after: self.config.reset_timeout - elapsed,
                        location: ErrorLocation::from(caller),
                    })
                }
            }
            CircuitState::HalfOpen if !guard.probe_in_flight => {
                guard.probe_in_flight = true;
                Ok(CallPermit::new(self, true))
            }
            CircuitState::HalfOpen => {
                self.metrics.breaker_rejected(&self.name);
                Err(BreakerError::Open {
                    retry_after: self.config.call_timeout,
                    location: ErrorLocation::from(caller),
                })
            }
        }
    }

    /// Run `operation` through the breaker with the configured deadline.
    ///
    /// `Ok` counts as success, `Err` and deadline expiry as failures. If the
    /// returned future is dropped before completing, the call counts as a
    /// failure. Errors carry the location of the `call` site.
    #[track_caller]
    pub fn call<T, E, F>(&self, operation: F) -> impl Future<Output = Result<T, BreakerError<E>>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let caller = Location::caller();

        async move {
            let permit = self.acquire_at(caller)?;

            match tokio::time::timeout(self.config.call_timeout, operation).await {
                Ok(Ok(value)) => {
                    permit.success();
                    Ok(value)
                }
                Ok(Err(e)) => {
                    permit.failure();
                    Err(BreakerError::Inner(e))
                }
                Err(_) => {
                    permit.failure();
                    Err(BreakerError::Timeout {
                        after: self.config.call_timeout,
                        location: ErrorLocation::from(caller),
                    })
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let guard = self.lock();
        CircuitSnapshot {
            name: self.name.clone(),
            state: guard.state,
            failure_count: guard.failure_count,
            threshold: self.config.failure_threshold,
            reset_timeout_secs: self.config.reset_timeout.as_secs(),
            last_transition_at: guard.last_transition_wall,
        }
    }

    fn record(&self, probe: bool, succeeded: bool) {
        let mut guard = self.lock();
        let now = Instant::now();

        if probe {
            guard.probe_in_flight = false;
            if succeeded {
                guard.failure_count = 0;
                guard.window_started_at = None;
                self.transition(&mut guard, CircuitState::Closed, now);
            } else {
                self.transition(&mut guard, CircuitState::Open, now);
            }
            return;
        }

        // Calls admitted while Closed that settle after the circuit moved on
        // say nothing about the current cooldown or trial.
        if guard.state != CircuitState::Closed {
            return;
        }

        if succeeded {
            guard.failure_count = 0;
            guard.window_started_at = None;
            return;
        }

        let window_expired = guard
            .window_started_at
            .is_none_or(|started| now.saturating_duration_since(started) > self.config.failure_window);
        if window_expired {
            guard.failure_count = 0;
            guard.window_started_at = Some(now);
        }

        guard.failure_count += 1;
        if guard.failure_count >= self.config.failure_threshold {
            self.transition(&mut guard, CircuitState::Open, now);
        }
    }

    fn transition(&self, guard: &mut BreakerState, to: CircuitState, now: Instant) {
        if guard.state == to {
            guard.last_transition_at = now;
            guard.last_transition_wall = Utc::now();
            return;
        }

        match to {
            CircuitState::Open => warn!(
                "Circuit breaker '{}' OPEN after {} failures (from {})",
                self.name,
                guard.failure_count,
                guard.state.as_str()
            ),
            _ => info!(
                "Circuit breaker '{}' {} -> {}",
                self.name,
                guard.state.as_str(),
                to.as_str()
            ),
        }

        guard.state = to;
        guard.last_transition_at = now;
        guard.last_transition_wall = Utc::now();
        self.metrics.breaker_transition(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // No update spans an await, so a poisoned state is still whole.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Admission to make one call through a [`CircuitBreaker`].
#[must_use = "a dropped permit records a failure"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    /// Whether this permit is the HalfOpen trial.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record(self.probe, true);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record(self.probe, false);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.record(self.probe, false);
        }
    }
}
