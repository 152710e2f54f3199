use crate::{AuthError, Result};

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use hmac::{Hmac, Mac};
use http::{HeaderMap, HeaderName};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies `hex(HMAC-SHA256(secret, raw_body))` sent by the identity
/// provider, optionally prefixed with `sha256=`.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    header: HeaderName,
}

impl SignatureVerifier {
    #[track_caller]
    pub fn new(secret: &str, header: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret {
                message: "secret cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let header = HeaderName::from_str(header.trim()).map_err(|e| AuthError::InvalidSecret {
            message: format!("invalid signature header name: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            header,
        })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Hex signature for `body`, as the provider would send it.
    pub fn sign(&self, body: &[u8]) -> Result<String> {
        Ok(hex::encode(self.digest(body)?))
    }

    /// Check the signature header against `body`. The body must be the raw
    /// bytes received, before any parsing.
    #[track_caller]
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<()> {
        let Some(value) = headers.get(&self.header).and_then(|v| v.to_str().ok()) else {
            return Err(invalid("signature header missing"));
        };

        let value = value.trim();
        let hex_signature = value.strip_prefix(SIGNATURE_PREFIX).unwrap_or(value);

        let Ok(provided) = hex::decode(hex_signature) else {
            return Err(invalid("signature is not hex encoded"));
        };

        let expected = self.digest(body)?;
        if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            Ok(())
        } else {
            Err(invalid("signature mismatch"))
        }
    }

    fn digest(&self, body: &[u8]) -> Result<Vec<u8>> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret).map_err(|e| {
            AuthError::InvalidSecret {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .field("header", &self.header)
            .finish()
    }
}

#[track_caller]
fn invalid(reason: &'static str) -> AuthError {
    AuthError::SignatureInvalid {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}
