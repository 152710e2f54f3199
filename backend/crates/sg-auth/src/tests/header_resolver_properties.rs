use crate::tests::{authentik_resolver, headers};
use crate::{AuthError, SignatureVerifier};

use chrono::Utc;
use proptest::prelude::*;

const SECRET: &str = "property-test-secret-0123456789abcdef";

// =========================================================================
// Property-Based Tests - Header Resolution
// =========================================================================

proptest! {
    #[test]
    fn given_all_required_headers_when_resolved_then_values_match_exactly(
        email in "[a-z0-9]{1,20}@[a-z]{1,10}\\.com",
        username in "[a-zA-Z0-9_.-]{1,30}",
        name in "[A-Za-z][A-Za-z ]{0,30}[A-Za-z]",
    ) {
        let resolver = authentik_resolver();
        let request = headers(&[
            ("X-authentik-email", email.as_str()),
            ("X-authentik-username", username.as_str()),
            ("X-authentik-name", name.as_str()),
        ]);

        let identity = resolver.resolve(&request, Utc::now()).unwrap();

        prop_assert_eq!(identity.email, email);
        prop_assert_eq!(&identity.username, username.as_str());
        prop_assert_eq!(identity.display_name, name);
        prop_assert_eq!(identity.external_id, username);
    }

    #[test]
    fn given_any_required_header_removed_when_resolved_then_unauthenticated(
        email in "[a-z0-9]{1,20}@[a-z]{1,10}\\.com",
        username in "[a-z0-9]{1,30}",
        drop_email in any::<bool>(),
    ) {
        let resolver = authentik_resolver();
        let request = if drop_email {
            headers(&[("X-authentik-username", username.as_str()), ("X-authentik-name", "A")])
        } else {
            headers(&[("X-authentik-email", email.as_str()), ("X-authentik-name", "A")])
        };

        let result = resolver.resolve(&request, Utc::now());

        prop_assert!(matches!(result, Err(ref e) if e.is_unauthenticated()));
    }

    #[test]
    fn given_any_body_when_signed_then_verifies(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let verifier = SignatureVerifier::new(SECRET, "X-Webhook-Signature").unwrap();
        let signature = verifier.sign(&body).unwrap();
        let request = headers(&[("X-Webhook-Signature", signature.as_str())]);

        prop_assert!(verifier.verify(&request, &body).is_ok());
    }

    #[test]
    fn given_body_changed_after_signing_when_verified_then_rejected(
        body in proptest::collection::vec(any::<u8>(), 1..256),
        flip in any::<prop::sample::Index>(),
    ) {
        let verifier = SignatureVerifier::new(SECRET, "X-Webhook-Signature").unwrap();
        let signature = verifier.sign(&body).unwrap();
        let request = headers(&[("X-Webhook-Signature", signature.as_str())]);

        let mut tampered = body.clone();
        let i = flip.index(tampered.len());
        tampered[i] ^= 0x01;

        let result = verifier.verify(&request, &tampered);
        prop_assert!(matches!(result, Err(AuthError::SignatureInvalid { .. })), "tampered body accepted");
    }
}
