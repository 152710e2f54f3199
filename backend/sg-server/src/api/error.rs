//! HTTP error responses
//!
//! Every refusal is `{ "error": { "code", "message" } }`. Messages name
//! fields and reasons only, never header values, secrets or signatures.

use sg_bridge::IngestError;
use sg_store::StoreError;

use std::panic::Location;
use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g., "AUTHENTICATION_MISSING")
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401
    #[error("Unauthorized ({code}): {message} {location}")]
    Unauthorized {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },

    /// 400
    #[error("Bad request ({code}): {message} {location}")]
    BadRequest {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },

    /// 404
    #[error("Not found: {message} {location}")]
    NotFound {
        message: String,
        location: ErrorLocation,
    },

    /// 503 with `Retry-After` when known
    #[error("Service unavailable ({code}): {message} {location}")]
    Unavailable {
        code: &'static str,
        message: String,
        retry_after: Option<Duration>,
        location: ErrorLocation,
    },

    /// 500
    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn unavailable(
        code: &'static str,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::Unavailable {
            code,
            message: message.into(),
            retry_after,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("{}", self);
        } else {
            log::debug!("{}", self);
        }

        let (body, retry_after) = match self {
            ApiError::Unauthorized { code, message, .. }
            | ApiError::BadRequest { code, message, .. } => (
                ApiErrorBody {
                    code: code.into(),
                    message,
                },
                None,
            ),
            ApiError::NotFound { message, .. } => (
                ApiErrorBody {
                    code: "NOT_FOUND".into(),
                    message,
                },
                None,
            ),
            ApiError::Unavailable {
                code,
                message,
                retry_after,
                ..
            } => (
                ApiErrorBody {
                    code: code.into(),
                    message,
                },
                retry_after,
            ),
            ApiError::Internal { message, .. } => (
                ApiErrorBody {
                    code: "INTERNAL_ERROR".into(),
                    message,
                },
                None,
            ),
        };

        let mut response = (status, Json(ApiErrorResponse { error: body })).into_response();
        if let Some(retry_after) = retry_after {
            response.headers_mut().insert(
                RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
        }
        response
    }
}

/// Store failures never leak driver details to clients
impl From<StoreError> for ApiError {
    #[track_caller]
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { key, .. } => ApiError::not_found(format!("No shadow user {}", key)),
            other => {
                log::error!("Shadow store error: {}", other);
                ApiError::unavailable("STORE_UNAVAILABLE", "Shadow store unavailable", None)
            }
        }
    }
}

impl From<IngestError> for ApiError {
    #[track_caller]
    fn from(e: IngestError) -> Self {
        let code = e.error_code();
        match e {
            IngestError::Signature(_) => {
                ApiError::unauthorized(code, "Webhook signature missing or invalid")
            }
            IngestError::Malformed(source) => {
                log::debug!("Malformed webhook: {}", source);
                ApiError::BadRequest {
                    code,
                    message: "Webhook body is not a valid identity event".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            }
            IngestError::Store(source) => {
                log::error!("Shadow store error during webhook: {}", source);
                ApiError::unavailable(code, "Shadow store unavailable, retry later", None)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
