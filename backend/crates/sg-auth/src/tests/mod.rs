mod header_resolver_properties;

use crate::{HeaderMapping, HeaderResolver};

use http::{HeaderMap, HeaderValue};

/// authentik-style mapping with email and username required.
pub(crate) fn authentik_resolver() -> HeaderResolver {
    let mapping = HeaderMapping::new(
        [
            ("external_id", "X-authentik-uid"),
            ("email", "X-authentik-email"),
            ("username", "X-authentik-username"),
            ("display_name", "X-authentik-name"),
            ("groups", "X-authentik-groups"),
        ],
        ["email", "username"],
        "authentik",
    )
    .unwrap();
    HeaderResolver::new(mapping)
}

pub(crate) fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(*name, HeaderValue::from_str(value).unwrap());
    }
    map
}
