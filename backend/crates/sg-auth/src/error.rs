use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No mapped header was sent; the proxy did not authenticate the caller.
    #[error("No identity headers present {location}")]
    AuthenticationMissing { location: ErrorLocation },

    /// Some identity headers were sent but required ones are absent or empty,
    /// or a mapped header arrived more than once.
    #[error("Identity fields unusable: {} {location}", fields.join(", "))]
    AuthenticationMalformed {
        fields: Vec<String>,
        location: ErrorLocation,
    },

    #[error("Webhook signature invalid: {reason} {location}")]
    SignatureInvalid {
        reason: &'static str,
        location: ErrorLocation,
    },

    #[error("Invalid header mapping for '{field}': {message} {location}")]
    InvalidMapping {
        field: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid webhook secret: {message} {location}")]
    InvalidSecret {
        message: String,
        location: ErrorLocation,
    },
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthenticationMissing { .. } => "AUTHENTICATION_MISSING",
            Self::AuthenticationMalformed { .. } => "AUTHENTICATION_MALFORMED",
            Self::SignatureInvalid { .. } => "SIGNATURE_INVALID",
            Self::InvalidMapping { .. } => "INVALID_HEADER_MAPPING",
            Self::InvalidSecret { .. } => "INVALID_WEBHOOK_SECRET",
        }
    }

    /// Both resolver failures map to the same external answer.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationMissing { .. } | Self::AuthenticationMalformed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
