pub mod app_state;
pub mod circuit_breaker;
pub mod downstream_validator;
pub mod error;
pub mod forward_auth;
pub mod identity_headers;
pub mod metrics;
pub mod request_context;
pub mod webhook_ingest;

pub use app_state::AppState;
pub use circuit_breaker::{
    BreakerError, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState,
};
pub use downstream_validator::{DownstreamValidator, HttpDownstreamValidator, ValidationOutcome};
pub use error::{DownstreamError, IngestError, Result};
pub use forward_auth::{DegradeReason, ForwardAuthDecision, ForwardAuthResponder, RejectReason};
pub use identity_headers::identity_headers;
pub use metrics::Metrics;
pub use request_context::RequestContext;
pub use webhook_ingest::{IngestOutcome, IngestReport, WebhookIngest};


use tracing::info_span;

/// Create a tracing span for a forward-auth or webhook request.
/// All log entries within the handler will include these fields.
pub fn create_request_span(correlation_id: &str, route: &str) -> tracing::Span {
    info_span!(
        "http_request",
        correlation_id = %correlation_id,
        route = %route,
    )
}
