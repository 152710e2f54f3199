use sg_core::UserRecord;

use http::{HeaderMap, HeaderName, HeaderValue};

pub const EXTERNAL_ID: HeaderName = HeaderName::from_static("x-identity-external-id");
pub const PROVIDER: HeaderName = HeaderName::from_static("x-identity-provider");
pub const EMAIL: HeaderName = HeaderName::from_static("x-identity-email");
pub const USERNAME: HeaderName = HeaderName::from_static("x-identity-username");
pub const DISPLAY_NAME: HeaderName = HeaderName::from_static("x-identity-display-name");
pub const GROUPS: HeaderName = HeaderName::from_static("x-identity-groups");

/// Normalized identity headers for a stored record.
///
/// Empty fields are omitted, groups are comma joined. Values that cannot be
/// carried in a header (control characters) are dropped.
pub fn identity_headers(record: &UserRecord) -> HeaderMap {
    let groups = record.groups.join(",");
    let fields = [
        (EXTERNAL_ID, record.external_id.as_str()),
        (PROVIDER, record.provider.as_str()),
        (EMAIL, record.email.as_str()),
        (USERNAME, record.username.as_str()),
        (DISPLAY_NAME, record.display_name.as_str()),
        (GROUPS, groups.as_str()),
    ];

    let mut headers = HeaderMap::with_capacity(fields.len());
    for (name, value) in fields {
        if value.is_empty() {
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
    headers
}
