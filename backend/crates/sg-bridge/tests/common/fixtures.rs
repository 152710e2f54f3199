use sg_auth::{HeaderMapping, HeaderResolver, SignatureVerifier};
use sg_bridge::{CircuitBreaker, CircuitBreakerConfig};

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};

pub const PROVIDER: &str = "authentik";
pub const SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// authentik header names, with email and username required.
pub fn authentik_resolver() -> HeaderResolver {
    let mapping = HeaderMapping::new(
        [
            ("external_id", "X-authentik-uid"),
            ("email", "X-authentik-email"),
            ("username", "X-authentik-username"),
            ("display_name", "X-authentik-name"),
            ("groups", "X-authentik-groups"),
        ],
        ["email", "username"],
        PROVIDER,
    )
    .expect("valid mapping");
    HeaderResolver::new(mapping)
}

pub fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).expect("valid header name"),
            HeaderValue::from_str(value).expect("valid header value"),
        );
    }
    map
}

/// Headers the proxy sends for user `a`.
pub fn alice_headers() -> HeaderMap {
    headers(&[
        ("X-authentik-email", "a@x.com"),
        ("X-authentik-username", "a"),
        ("X-authentik-name", "A"),
    ])
}

pub fn breaker(threshold: u32) -> CircuitBreaker {
    CircuitBreaker::new(
        "downstream",
        CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_timeout: Duration::from_secs(30),
            failure_window: Duration::from_secs(60),
            call_timeout: Duration::from_secs(3),
        },
    )
}

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(SECRET, SIGNATURE_HEADER).expect("valid secret")
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

/// Headers carrying a valid signature for `body`.
pub fn signed(body: &[u8]) -> HeaderMap {
    let signature = verifier().sign(body).expect("signable body");
    headers(&[(SIGNATURE_HEADER, format!("sha256={}", signature).as_str())])
}
