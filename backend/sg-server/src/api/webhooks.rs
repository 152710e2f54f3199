use crate::api::error::{ApiError, Result as ApiResult};

use sg_bridge::{AppState, IngestOutcome};

use axum::{Json, extract::State, http::HeaderMap};
use bytes::Bytes;
use serde::Serialize;

pub const ROUTE: &str = "/webhooks/identity";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub outcome: IngestOutcome,
    pub event_id: String,
}

/// POST /webhooks/identity - signed lifecycle event from the provider
///
/// The body is taken raw; the signature covers the exact bytes received.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let Some(ingest) = state.ingest.as_ref() else {
        return Err(ApiError::unavailable(
            "WEBHOOKS_DISABLED",
            "Webhook ingestion is not enabled",
            None,
        ));
    };

    let report = ingest.ingest(&headers, &body).await?;

    Ok(Json(WebhookResponse {
        outcome: report.outcome,
        event_id: report.event_id,
    }))
}
