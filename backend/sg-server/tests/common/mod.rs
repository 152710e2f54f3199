#![allow(dead_code)]

//! Test infrastructure for sg-server HTTP tests

mod down_store;

pub use down_store::DownStore;

use sg_auth::SignatureVerifier;
use sg_bridge::AppState;
use sg_config::Config;
use sg_server::{build_router, build_state};
use sg_store::{MemoryStore, ShadowStore};

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};

pub const WEBHOOK_SECRET: &str = "test-webhook-secret-at-least-32-bytes-long";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Test server with access to the store behind it
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<dyn ShadowStore>,
    pub state: AppState,
}

/// Defaults plus webhooks and admin endpoints, authentik headers.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.webhook.enabled = true;
    config.webhook.secret = Some(WEBHOOK_SECRET.to_string());
    config.admin.enabled = true;
    config
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_config(test_config())
}

pub fn create_test_app_with_config(config: Config) -> TestApp {
    create_test_app_with_store(config, Arc::new(MemoryStore::new(true)))
}

pub fn create_test_app_with_store(config: Config, store: Arc<dyn ShadowStore>) -> TestApp {
    let state = build_state(&config, Arc::clone(&store)).expect("Failed to build app state");
    let router = build_router(state.clone(), 64, None);
    let server = TestServer::builder()
        .http_transport()
        .build(router)
        .expect("Failed to create test server");

    TestApp {
        server,
        store,
        state,
    }
}

pub fn envelope(event_id: &str, event_type: &str, occurred_at: &str, payload: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "eventId": event_id,
        "type": event_type,
        "occurredAt": occurred_at,
        "payload": payload,
    }))
    .expect("serializable envelope")
}

pub fn sign(body: &[u8]) -> String {
    SignatureVerifier::new(WEBHOOK_SECRET, SIGNATURE_HEADER)
        .and_then(|v| v.sign(body))
        .map(|signature| format!("sha256={}", signature))
        .expect("signable body")
}
