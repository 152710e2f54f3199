use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Circuit breaker constraints
pub const MIN_FAILURE_THRESHOLD: u32 = 1;
pub const MAX_FAILURE_THRESHOLD: u32 = 100;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

pub const MIN_RESET_TIMEOUT_SECS: u64 = 1;
pub const MAX_RESET_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_RESET_TIMEOUT_SECS: u64 = 30;

pub const MIN_FAILURE_WINDOW_SECS: u64 = 1;
pub const MAX_FAILURE_WINDOW_SECS: u64 = 600;
pub const DEFAULT_FAILURE_WINDOW_SECS: u64 = 60;

/// Circuit breaker configuration for the downstream application.
///
/// The breaker stops calling the downstream application for a cooldown
/// period once it keeps failing, so a slow dependency cannot tie up every
/// forward-auth check.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    pub failure_threshold: u32,
    /// Seconds to keep the circuit open before a single trial call
    pub reset_timeout_secs: u64,
    /// Failures further apart than this restart the count
    pub failure_window_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_secs: DEFAULT_RESET_TIMEOUT_SECS,
            failure_window_secs: DEFAULT_FAILURE_WINDOW_SECS,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.failure_threshold < MIN_FAILURE_THRESHOLD
            || self.failure_threshold > MAX_FAILURE_THRESHOLD
        {
            return Err(ConfigError::config(format!(
                "circuit_breaker.failure_threshold must be {}-{}, got {}",
                MIN_FAILURE_THRESHOLD, MAX_FAILURE_THRESHOLD, self.failure_threshold
            )));
        }

        if self.reset_timeout_secs < MIN_RESET_TIMEOUT_SECS
            || self.reset_timeout_secs > MAX_RESET_TIMEOUT_SECS
        {
            return Err(ConfigError::config(format!(
                "circuit_breaker.reset_timeout_secs must be {}-{}, got {}",
                MIN_RESET_TIMEOUT_SECS, MAX_RESET_TIMEOUT_SECS, self.reset_timeout_secs
            )));
        }

        if self.failure_window_secs < MIN_FAILURE_WINDOW_SECS
            || self.failure_window_secs > MAX_FAILURE_WINDOW_SECS
        {
            return Err(ConfigError::config(format!(
                "circuit_breaker.failure_window_secs must be {}-{}, got {}",
                MIN_FAILURE_WINDOW_SECS, MAX_FAILURE_WINDOW_SECS, self.failure_window_secs
            )));
        }

        Ok(())
    }
}
