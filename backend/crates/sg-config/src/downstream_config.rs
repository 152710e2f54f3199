use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Downstream validation constraints
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;

pub const MIN_RETRY_AFTER_SECS: u64 = 1;
pub const MAX_RETRY_AFTER_SECS: u64 = 300;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub const DEFAULT_VALIDATE_PATH: &str = "/api/session/validate";

/// Optional session validation against the downstream application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    pub enabled: bool,
    /// e.g. "http://collab:8080"
    pub base_url: Option<String>,
    pub validate_path: String,
    /// Deadline for one validation call
    pub timeout_secs: u64,
    /// Retry-After hint sent with 503 on timeouts and downstream failures
    pub retry_after_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            validate_path: String::from(DEFAULT_VALIDATE_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        }
    }
}

impl DownstreamConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.timeout_secs < MIN_TIMEOUT_SECS || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::downstream(format!(
                "downstream.timeout_secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        if self.retry_after_secs < MIN_RETRY_AFTER_SECS
            || self.retry_after_secs > MAX_RETRY_AFTER_SECS
        {
            return Err(ConfigError::downstream(format!(
                "downstream.retry_after_secs must be {}-{}, got {}",
                MIN_RETRY_AFTER_SECS, MAX_RETRY_AFTER_SECS, self.retry_after_secs
            )));
        }

        if !self.enabled {
            return Ok(());
        }

        match self.base_url.as_deref() {
            None => {
                return Err(ConfigError::downstream(
                    "downstream.base_url is required when downstream.enabled = true",
                ));
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(ConfigError::downstream(format!(
                    "downstream.base_url must start with http:// or https://, got '{}'",
                    url
                )));
            }
            Some(_) => {}
        }

        if !self.validate_path.starts_with('/') {
            return Err(ConfigError::downstream(format!(
                "downstream.validate_path must start with '/', got '{}'",
                self.validate_path
            )));
        }

        Ok(())
    }
}
