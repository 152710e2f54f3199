use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid identity: {message} {location}")]
    InvalidIdentity {
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed webhook envelope: {message} {location}")]
    MalformedEnvelope {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid webhook payload for '{event_type}': {message} {location}")]
    InvalidPayload {
        event_type: String,
        message: String,
        location: ErrorLocation,
    },
}

pub type CoreResult<T> = StdResult<T, CoreError>;
