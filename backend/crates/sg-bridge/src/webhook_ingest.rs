use crate::{IngestError, Metrics, Result};

use sg_auth::SignatureVerifier;
use sg_core::{
    CoreError, EventType, Identity, IdentityKey, MergeOutcome, UserPayload, UserRecord,
    WebhookEvent,
};
use sg_store::{EventEffect, EventMutation, ShadowStore, StoreError};

use std::panic::Location;
use std::sync::Arc;

use error_location::ErrorLocation;
use http::HeaderMap;
use log::{debug, error, info, warn};
use serde::Serialize;

/// What a delivered event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Applied,
    Duplicate,
    Ignored,
    Stale,
    NotFound,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Duplicate => "duplicate",
            Self::Ignored => "ignored",
            Self::Stale => "stale",
            Self::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    pub event_id: String,
    /// Current record for the event's key, when there is one.
    pub record: Option<UserRecord>,
}

/// Verified, idempotent application of provider lifecycle events.
pub struct WebhookIngest {
    verifier: SignatureVerifier,
    store: Arc<dyn ShadowStore>,
    default_provider: String,
    metrics: Metrics,
}

impl WebhookIngest {
    pub fn new(
        verifier: SignatureVerifier,
        store: Arc<dyn ShadowStore>,
        default_provider: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            store,
            default_provider: default_provider.into(),
            metrics: Metrics::new(),
        }
    }

    pub fn signature_header(&self) -> &str {
        self.verifier.header().as_str()
    }

    /// Verify `body` against its signature header, then apply it.
    ///
    /// Nothing is parsed before the signature checks out.
    pub async fn ingest(&self, headers: &HeaderMap, body: &[u8]) -> Result<IngestReport> {
        if let Err(e) = self.verifier.verify(headers, body) {
            warn!("Webhook refused: {}", e.error_code());
            self.metrics.webhook_rejected("signature");
            return Err(IngestError::Signature(e));
        }

        let event = WebhookEvent::from_slice(body).inspect_err(|e| {
            warn!("Webhook refused: {}", e);
            self.metrics.webhook_rejected("malformed");
        })?;

        let report = self.apply(event).await?;
        info!(
            "Webhook {} -> {}",
            report.event_id,
            report.outcome.as_str()
        );
        self.metrics.webhook_outcome(report.outcome.as_str());
        Ok(report)
    }

    /// Apply an already verified event.
    pub async fn apply(&self, event: WebhookEvent) -> Result<IngestReport> {
        if !event.event_type.is_known() {
            debug!(
                "Webhook {} has unhandled type '{}', acknowledging",
                event.event_id, event.event_type
            );
            return Ok(IngestReport {
                outcome: IngestOutcome::Ignored,
                event_id: event.event_id,
                record: None,
            });
        }

        let payload = UserPayload::from_value(event.event_type.as_str(), &event.raw_payload)
            .inspect_err(|_| self.metrics.webhook_rejected("malformed"))?;

        if event.event_type == EventType::MembershipChanged && payload.groups.is_none() {
            self.metrics.webhook_rejected("malformed");
            return Err(IngestError::Malformed(CoreError::InvalidPayload {
                event_type: event.event_type.to_string(),
                message: "groups is required".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }));
        }

        let key = payload.key(&self.default_provider);

        let mutation = match event.event_type {
            EventType::UserDeleted => EventMutation::Delete {
                key: key.clone(),
                deprovisioned_at: event.occurred_at,
            },
            _ => {
                let identity = payload.into_identity(&self.default_provider, event.occurred_at);
                match self.complete(identity, &event).await? {
                    Some(identity) => EventMutation::Upsert(identity),
                    None => {
                        return Ok(IngestReport {
                            outcome: IngestOutcome::NotFound,
                            event_id: event.event_id,
                            record: None,
                        });
                    }
                }
            }
        };

        let (outcome, record) = match self.store.apply_event(&event, mutation).await {
            Ok(EventEffect::Duplicate) => {
                debug!("Webhook {} already processed", event.event_id);
                (IngestOutcome::Duplicate, self.current(&key).await?)
            }
            Ok(EventEffect::Upserted(upserted)) => {
                let outcome = match upserted.outcome {
                    MergeOutcome::Applied => IngestOutcome::Applied,
                    MergeOutcome::Stale => IngestOutcome::Stale,
                };
                (outcome, Some(upserted.record))
            }
            Ok(EventEffect::Deleted) => {
                info!("Deprovisioned {}", key);
                (IngestOutcome::Applied, None)
            }
            Ok(EventEffect::Superseded) => {
                debug!("Webhook {} is older than the state of {}", event.event_id, key);
                (IngestOutcome::Stale, self.current(&key).await?)
            }
            Ok(EventEffect::NotFound) => (IngestOutcome::NotFound, None),
            Err(StoreError::InvalidIdentity { source }) => {
                self.metrics.webhook_rejected("malformed");
                return Err(IngestError::Malformed(source));
            }
            Err(e) => return Err(self.store_failure("apply_event", e)),
        };

        Ok(IngestReport {
            outcome,
            event_id: event.event_id,
            record,
        })
    }

    /// Updates may carry only the changed fields; borrow the stored
    /// email/username so the identity stays valid. `None` when there is
    /// nothing to update.
    async fn complete(
        &self,
        mut identity: Identity,
        event: &WebhookEvent,
    ) -> Result<Option<Identity>> {
        if !identity.email.trim().is_empty() || !identity.username.trim().is_empty() {
            return Ok(Some(identity));
        }

        match self.current(&identity.key()).await? {
            Some(stored) => {
                identity.email = stored.email;
                identity.username = stored.username;
                Ok(Some(identity))
            }
            None if event.event_type == EventType::UserCreated => Ok(Some(identity)),
            None => Ok(None),
        }
    }

    async fn current(&self, key: &IdentityKey) -> Result<Option<UserRecord>> {
        match self.store.get(key).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(self.store_failure("get", e)),
        }
    }

    fn store_failure(&self, operation: &str, e: StoreError) -> IngestError {
        error!("Shadow store {} failed: {}", operation, e);
        self.metrics.store_error(operation);
        IngestError::Store(e)
    }
}
