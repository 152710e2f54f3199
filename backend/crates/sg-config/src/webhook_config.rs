use crate::resolver_config::is_token_byte;
use crate::{ConfigError, ConfigErrorResult};

use std::fmt;

use serde::Deserialize;

pub const MIN_SECRET_LENGTH: usize = 32;
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    /// Shared HMAC-SHA256 secret agreed with the identity provider
    pub secret: Option<String>,
    pub signature_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: None,
            signature_header: String::from(DEFAULT_SIGNATURE_HEADER),
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("enabled", &self.enabled)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("signature_header", &self.signature_header)
            .finish()
    }
}

impl WebhookConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.signature_header.is_empty() || !self.signature_header.bytes().all(is_token_byte)
        {
            return Err(ConfigError::webhook(format!(
                "webhook.signature_header is not a valid HTTP header name: '{}'",
                self.signature_header
            )));
        }

        if !self.enabled {
            return Ok(());
        }

        match &self.secret {
            None => Err(ConfigError::webhook(
                "webhook.secret is required when webhook.enabled = true",
            )),
            Some(secret) if secret.len() < MIN_SECRET_LENGTH => Err(ConfigError::webhook(
                format!(
                    "webhook.secret must be at least {} characters",
                    MIN_SECRET_LENGTH
                ),
            )),
            Some(_) => Ok(()),
        }
    }
}
