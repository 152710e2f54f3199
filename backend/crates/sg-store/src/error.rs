use sg_core::{CoreError, IdentityKey};

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {source} {location}")]
    Unavailable {
        source: sqlx::Error,
        location: ErrorLocation,
    },

    #[error("Shadow user not found: {key} {location}")]
    NotFound {
        key: IdentityKey,
        location: ErrorLocation,
    },

    #[error("Shadow user {key} was deprovisioned after this change {location}")]
    Superseded {
        key: IdentityKey,
        location: ErrorLocation,
    },

    #[error("Invalid identity: {source}")]
    InvalidIdentity {
        #[from]
        source: CoreError,
    },

    #[error("Corrupt stored row: {message} {location}")]
    Corrupt {
        message: String,
        location: ErrorLocation,
    },

    #[error("Migration error: {message} {location}")]
    Migration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Store initialization failed: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },
}

impl StoreError {
    #[track_caller]
    pub fn not_found(key: &IdentityKey) -> Self {
        Self::NotFound {
            key: key.clone(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn superseded(key: &IdentityKey) -> Self {
        Self::Superseded {
            key: key.clone(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The backend itself failed; callers should answer 503 and let the
    /// client retry.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. }
                | Self::Corrupt { .. }
                | Self::Migration { .. }
                | Self::Initialization { .. }
        )
    }
}

impl From<sqlx::Error> for StoreError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Unavailable {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
