use crate::error::Result as ServerErrorResult;

use sg_auth::{HeaderMapping, HeaderResolver, SignatureVerifier};
use sg_bridge::{
    AppState, CircuitBreaker, CircuitBreakerConfig, ForwardAuthResponder, HttpDownstreamValidator,
    WebhookIngest,
};
use sg_config::{Config, ConfigError};
use sg_store::ShadowStore;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

pub const DOWNSTREAM_BREAKER: &str = "downstream";

/// Wire resolver, breaker, responder and webhook pipeline around `store`.
pub fn build_state(config: &Config, store: Arc<dyn ShadowStore>) -> ServerErrorResult<AppState> {
    let mapping = HeaderMapping::new(
        config.resolver.headers.entries(),
        &config.resolver.required,
        config.resolver.default_provider.clone(),
    )?
    .with_groups_separator(config.resolver.groups_separator.clone());
    let resolver = HeaderResolver::new(mapping);

    let breaker = Arc::new(CircuitBreaker::new(
        DOWNSTREAM_BREAKER,
        CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker.failure_threshold,
            reset_timeout: Duration::from_secs(config.circuit_breaker.reset_timeout_secs),
            failure_window: Duration::from_secs(config.circuit_breaker.failure_window_secs),
            call_timeout: Duration::from_secs(config.downstream.timeout_secs),
        },
    ));

    let mut responder = ForwardAuthResponder::new(resolver, Arc::clone(&store), breaker)
        .with_retry_after(Duration::from_secs(config.downstream.retry_after_secs));

    if config.downstream.enabled {
        let base_url = config
            .downstream
            .base_url
            .as_deref()
            .ok_or_else(|| ConfigError::downstream("downstream.base_url is required"))?;
        let validator = HttpDownstreamValidator::new(
            base_url,
            &config.downstream.validate_path,
            Duration::from_secs(config.downstream.timeout_secs),
        )?;
        info!("Downstream session validation: {}", validator.url());
        responder = responder.with_downstream(Arc::new(validator));
    } else {
        info!("Downstream session validation disabled");
    }

    let ingest = if config.webhook.enabled {
        let secret = config
            .webhook
            .secret
            .as_deref()
            .ok_or_else(|| ConfigError::webhook("webhook.secret is required"))?;
        let verifier = SignatureVerifier::new(secret, &config.webhook.signature_header)?;
        Some(WebhookIngest::new(
            verifier,
            Arc::clone(&store),
            config.resolver.default_provider.clone(),
        ))
    } else {
        warn!("Webhook ingestion disabled: deliveries will be refused with 503");
        None
    };

    if config.admin.enabled {
        warn!("Admin endpoints enabled: /admin/users exposes shadow records");
    }

    Ok(AppState::new(responder, ingest, store).with_admin(config.admin.enabled))
}
