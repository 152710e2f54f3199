pub mod canonical_field;
pub mod error;
pub mod header_mapping;
pub mod header_resolver;
pub mod signature_verifier;

pub use canonical_field::CanonicalField;
pub use error::{AuthError, Result};
pub use header_mapping::HeaderMapping;
pub use header_resolver::HeaderResolver;
pub use signature_verifier::SignatureVerifier;

#[cfg(test)]
mod tests;
