use crate::DownstreamError;
use crate::identity_headers::identity_headers;

use sg_core::UserRecord;

use std::panic::Location;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::debug;
use reqwest::{Client as ReqwestClient, StatusCode};

/// What the downstream application said about the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    /// Session refused (401/403). The dependency itself is healthy.
    Rejected { status: u16 },
}

/// Session check against the downstream application.
#[async_trait]
pub trait DownstreamValidator: Send + Sync {
    async fn validate(&self, record: &UserRecord) -> Result<ValidationOutcome, DownstreamError>;
}

/// `GET {base_url}{validate_path}` carrying the normalized identity headers.
pub struct HttpDownstreamValidator {
    url: String,
    client: ReqwestClient,
}

impl HttpDownstreamValidator {
    /// `timeout` bounds the whole request; the breaker applies its own
    /// deadline on top.
    #[track_caller]
    pub fn new(
        base_url: &str,
        validate_path: &str,
        timeout: Duration,
    ) -> Result<Self, DownstreamError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownstreamError::Client {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), validate_path),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DownstreamValidator for HttpDownstreamValidator {
    async fn validate(&self, record: &UserRecord) -> Result<ValidationOutcome, DownstreamError> {
        let response = self
            .client
            .get(&self.url)
            .headers(identity_headers(record))
            .send()
            .await?;

        let status = response.status();
        debug!("Downstream validation for {} answered {}", record.key(), status);

        if status.is_success() {
            Ok(ValidationOutcome::Accepted)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Ok(ValidationOutcome::Rejected {
                status: status.as_u16(),
            })
        } else {
            Err(DownstreamError::Status {
                status: status.as_u16(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
