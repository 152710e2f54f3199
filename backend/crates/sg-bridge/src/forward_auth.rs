use crate::{
    BreakerError, CircuitBreaker, DownstreamValidator, Metrics, RequestContext, ValidationOutcome,
    create_request_span,
};

use sg_auth::HeaderResolver;
use sg_core::UserRecord;
use sg_store::ShadowStore;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::HeaderMap;
use log::{debug, error, info, warn};
use tracing::Instrument;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Why a request was refused outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Identity headers absent or incomplete. Carries the auth error code.
    Unauthenticated { code: &'static str },
    /// The downstream application refused the session.
    SessionRejected { status: u16 },
}

/// Why a request could not be decided right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    StoreUnavailable,
    BreakerOpen,
    DownstreamTimeout,
    DownstreamFailed,
}

impl DegradeReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::BreakerOpen => "BREAKER_OPEN",
            Self::DownstreamTimeout => "DOWNSTREAM_TIMEOUT",
            Self::DownstreamFailed => "DOWNSTREAM_UNAVAILABLE",
        }
    }
}

/// Result of one forward-auth check.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardAuthDecision {
    /// 200 with identity headers built from `record`.
    Allow { record: UserRecord },
    /// 401.
    Reject { reason: RejectReason },
    /// 503 with `Retry-After`.
    Degrade {
        retry_after: Duration,
        reason: DegradeReason,
    },
}

impl ForwardAuthDecision {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Allow { .. } => "allow",
            Self::Reject { .. } => "reject",
            Self::Degrade { .. } => "degrade",
        }
    }
}

/// Decides forward-auth subrequests: resolve, record, optionally validate
/// downstream.
pub struct ForwardAuthResponder {
    resolver: HeaderResolver,
    store: Arc<dyn ShadowStore>,
    breaker: Arc<CircuitBreaker>,
    downstream: Option<Arc<dyn DownstreamValidator>>,
    retry_after: Duration,
    metrics: Metrics,
}

impl ForwardAuthResponder {
    pub fn new(
        resolver: HeaderResolver,
        store: Arc<dyn ShadowStore>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            resolver,
            store,
            breaker,
            downstream: None,
            retry_after: DEFAULT_RETRY_AFTER,
            metrics: Metrics::new(),
        }
    }

    pub fn with_downstream(mut self, validator: Arc<dyn DownstreamValidator>) -> Self {
        self.downstream = Some(validator);
        self
    }

    /// `Retry-After` for store and downstream failures. An open breaker
    /// reports its own remaining cooldown instead.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn downstream_enabled(&self) -> bool {
        self.downstream.is_some()
    }

    pub async fn check(&self, headers: &HeaderMap, ctx: &RequestContext) -> ForwardAuthDecision {
        let span = create_request_span(&ctx.correlation_id, ctx.route);

        let decision = self.decide(headers, ctx).instrument(span).await;

        self.metrics.forward_auth_decision(decision.outcome());
        self.metrics.forward_auth_latency(ctx.elapsed());
        decision
    }

    async fn decide(&self, headers: &HeaderMap, ctx: &RequestContext) -> ForwardAuthDecision {
        let prefix = ctx.log_prefix();

        let identity = match self.resolver.resolve(headers, Utc::now()) {
            Ok(identity) => identity,
            Err(e) => {
                debug!("{} Unauthenticated: {}", prefix, e.error_code());
                return ForwardAuthDecision::Reject {
                    reason: RejectReason::Unauthenticated {
                        code: e.error_code(),
                    },
                };
            }
        };

        let record = match self.store.upsert(&identity).await {
            Ok(upserted) => upserted.record,
            Err(e) => {
                error!("{} Shadow store upsert for {} failed: {}", prefix, identity.key(), e);
                self.metrics.store_error("upsert");
                return self.degrade(DegradeReason::StoreUnavailable, self.retry_after);
            }
        };

        let Some(validator) = &self.downstream else {
            debug!("{} Allowed {}", prefix, record.key());
            return ForwardAuthDecision::Allow { record };
        };

        match self.breaker.call(validator.validate(&record)).await {
            Ok(ValidationOutcome::Accepted) => {
                debug!("{} Allowed {} after downstream check", prefix, record.key());
                ForwardAuthDecision::Allow { record }
            }
            Ok(ValidationOutcome::Rejected { status }) => {
                info!("{} Downstream rejected session for {} ({})", prefix, record.key(), status);
                ForwardAuthDecision::Reject {
                    reason: RejectReason::SessionRejected { status },
                }
            }
            Err(BreakerError::Open { retry_after, .. }) => {
                debug!("{} Breaker '{}' open", prefix, self.breaker.name());
                self.degrade(DegradeReason::BreakerOpen, retry_after)
            }
            Err(BreakerError::Timeout { after, .. }) => {
                warn!("{} Downstream check timed out after {}ms", prefix, after.as_millis());
                self.degrade(DegradeReason::DownstreamTimeout, self.retry_after)
            }
            Err(BreakerError::Inner(e)) => {
                warn!("{} Downstream check failed: {}", prefix, e);
                self.degrade(DegradeReason::DownstreamFailed, self.retry_after)
            }
        }
    }

    fn degrade(&self, reason: DegradeReason, retry_after: Duration) -> ForwardAuthDecision {
        ForwardAuthDecision::Degrade {
            retry_after: at_least_one_second(retry_after),
            reason,
        }
    }
}

/// Whole seconds, rounded up, never below one.
pub(crate) fn at_least_one_second(duration: Duration) -> Duration {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    Duration::from_secs(secs.max(1))
}
