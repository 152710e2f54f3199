use crate::api::{admin, forward_auth, webhooks};
use crate::health;

use sg_bridge::AppState;

use axum::{
    Router,
    routing::{any, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::limit::GlobalConcurrencyLimitLayer;

/// Build the application router with all endpoints
///
/// `max_connections` bounds in-flight requests across every route.
/// `metrics` mounts `/metrics` when an exporter is installed.
pub fn build_router(
    state: AppState,
    max_connections: usize,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let mut router = Router::new()
        // Forward-auth subrequest; proxies differ in the method they forward
        .route(forward_auth::ROUTE, any(forward_auth::verify))
        .route(webhooks::ROUTE, post(webhooks::receive))
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        .route("/ready", get(health::readiness_check));

    if state.admin_enabled {
        router = router
            .route("/admin/users", get(admin::list_users))
            .route("/admin/users/{provider}/{external_id}", get(admin::get_user));
    }

    if let Some(handle) = metrics {
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    router
        .with_state(state)
        .layer(GlobalConcurrencyLimitLayer::new(max_connections))
}
