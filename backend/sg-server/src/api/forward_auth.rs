use crate::api::error::{ApiError, Result as ApiResult};

use sg_bridge::{
    AppState, DegradeReason, ForwardAuthDecision, RejectReason, RequestContext, identity_headers,
};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

pub const ROUTE: &str = "/auth/verify";

/// Correlation id set by the proxy, echoed back on every response
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// ANY /auth/verify - forward-auth subrequest from the proxy
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let request_id = headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok());
    let ctx = RequestContext::new(ROUTE, request_id);

    match state.responder.check(&headers, &ctx).await {
        ForwardAuthDecision::Allow { record } => {
            let mut response_headers = identity_headers(&record);
            if let Ok(value) = HeaderValue::from_str(&ctx.correlation_id) {
                response_headers.insert(REQUEST_ID_HEADER, value);
            }
            Ok((StatusCode::OK, response_headers).into_response())
        }
        ForwardAuthDecision::Reject {
            reason: RejectReason::Unauthenticated { code },
        } => Err(ApiError::unauthorized(
            code,
            "Identity headers missing or incomplete",
        )),
        ForwardAuthDecision::Reject {
            reason: RejectReason::SessionRejected { .. },
        } => Err(ApiError::unauthorized(
            "SESSION_REJECTED",
            "Session rejected by the application",
        )),
        ForwardAuthDecision::Degrade {
            retry_after,
            reason,
        } => Err(ApiError::unavailable(
            reason.code(),
            degrade_message(reason),
            Some(retry_after),
        )),
    }
}

fn degrade_message(reason: DegradeReason) -> &'static str {
    match reason {
        DegradeReason::StoreUnavailable => "Shadow store unavailable",
        DegradeReason::BreakerOpen => "Session validation temporarily suspended",
        DegradeReason::DownstreamTimeout => "Session validation timed out",
        DegradeReason::DownstreamFailed => "Session validation failed",
    }
}
