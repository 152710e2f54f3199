use crate::{CircuitBreaker, ForwardAuthResponder, Metrics, WebhookIngest};

use sg_store::ShadowStore;

use std::sync::Arc;

/// Shared application state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<ForwardAuthResponder>,
    /// `None` when webhooks are disabled; deliveries get a 503.
    pub ingest: Option<Arc<WebhookIngest>>,
    pub store: Arc<dyn ShadowStore>,
    pub breaker: Arc<CircuitBreaker>,
    pub metrics: Metrics,
    pub admin_enabled: bool,
}

impl AppState {
    pub fn new(
        responder: ForwardAuthResponder,
        ingest: Option<WebhookIngest>,
        store: Arc<dyn ShadowStore>,
    ) -> Self {
        let breaker = Arc::clone(responder.breaker());
        Self {
            responder: Arc::new(responder),
            ingest: ingest.map(Arc::new),
            store,
            breaker,
            metrics: Metrics::new(),
            admin_enabled: false,
        }
    }

    pub fn with_admin(mut self, enabled: bool) -> Self {
        self.admin_enabled = enabled;
        self
    }
}
