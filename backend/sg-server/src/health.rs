use sg_bridge::{AppState, CircuitState};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// GET /health - component status
///
/// Degraded (still 200) while the breaker is not closed.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let store_ok = state.store.ping().await.is_ok();
    let breaker = state.breaker.snapshot();

    let status = if !store_ok {
        "unhealthy"
    } else if breaker.state != CircuitState::Closed {
        "degraded"
    } else {
        "healthy"
    };

    let health = json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "store": {
                "backend": state.store.backend_name(),
                "durable": state.store.is_durable(),
                "reachable": store_ok,
            },
            "downstream": {
                "enabled": state.responder.downstream_enabled(),
                "breaker": breaker,
            },
            "webhooks": {
                "enabled": state.ingest.is_some(),
            },
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(health)).into_response()
}

/// GET /live - liveness probe (is the process alive?)
pub async fn liveness_check() -> Response {
    (StatusCode::OK, "OK").into_response()
}

/// GET /ready - readiness probe: the shadow store must answer
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "Ready").into_response(),
        Err(e) => {
            log::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Shadow store unavailable").into_response()
        }
    }
}
