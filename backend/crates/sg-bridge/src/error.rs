use sg_auth::AuthError;
use sg_core::CoreError;
use sg_store::StoreError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Failure talking to the downstream application. Every variant counts
/// against the circuit breaker.
#[derive(Error, Debug)]
pub enum DownstreamError {
    #[error("Downstream request failed: {source} {location}")]
    Transport {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Downstream answered {status} {location}")]
    Status { status: u16, location: ErrorLocation },

    #[error("Downstream client setup failed: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },
}

impl From<reqwest::Error> for DownstreamError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Transport {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Why a webhook delivery was refused.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Signature(AuthError),

    #[error(transparent)]
    Malformed(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Signature(_) => "SIGNATURE_INVALID",
            Self::Malformed(_) => "MALFORMED_EVENT",
            Self::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
