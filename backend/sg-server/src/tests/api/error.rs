use crate::ApiError;

use sg_auth::SignatureVerifier;
use sg_bridge::IngestError;
use sg_core::{CoreError, IdentityKey};
use sg_store::StoreError;

use std::panic::Location;
use std::time::Duration;

use axum::response::IntoResponse;
use error_location::ErrorLocation;
use http::StatusCode;
use http_body_util::BodyExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn given_unauthorized_when_rendered_then_401_with_code() {
    let error = ApiError::unauthorized("AUTHENTICATION_MISSING", "Identity headers missing");
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "AUTHENTICATION_MISSING");
    assert_eq!(json["error"]["message"], "Identity headers missing");
}

#[tokio::test]
async fn given_unavailable_with_retry_after_when_rendered_then_header_in_seconds() {
    let error = ApiError::unavailable("BREAKER_OPEN", "suspended", Some(Duration::from_secs(17)));
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get("retry-after").unwrap(), "17");
}

#[tokio::test]
async fn given_unavailable_without_retry_after_when_rendered_then_no_header() {
    let error = ApiError::unavailable("WEBHOOKS_DISABLED", "off", None);
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get("retry-after").is_none());
}

#[tokio::test]
async fn given_store_not_found_when_converted_then_404() {
    let error: ApiError = StoreError::not_found(&IdentityKey::new("authentik", "u-1")).into();
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn given_store_failure_when_converted_then_503_without_driver_details() {
    let error: ApiError = StoreError::Initialization {
        message: "disk I/O error at /var/lib/secret/path".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
    .into();
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "STORE_UNAVAILABLE");
    assert!(!json.to_string().contains("/var/lib/secret/path"));
}

#[tokio::test]
async fn given_signature_failure_when_converted_then_401() {
    let verifier = SignatureVerifier::new("0123456789abcdef0123456789abcdef", "X-Sig").unwrap();
    let auth_error = verifier
        .verify(&http::HeaderMap::new(), b"{}")
        .unwrap_err();
    let error: ApiError = IngestError::Signature(auth_error).into();
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "SIGNATURE_INVALID");
}

#[tokio::test]
async fn given_malformed_event_when_converted_then_400_without_payload_echo() {
    let error: ApiError = IngestError::Malformed(CoreError::MalformedEnvelope {
        message: "expected value at line 1 column 1: totally-private".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
    .into();
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "MALFORMED_EVENT");
    assert!(!json.to_string().contains("totally-private"));
}
