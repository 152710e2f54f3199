use crate::{AuthError, CanonicalField, HeaderMapping, Result};

use sg_core::Identity;

use std::collections::HashMap;
use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use http::HeaderMap;
use log::{debug, warn};

/// Resolves the caller from headers injected by the authenticating proxy.
///
/// Only mapped headers are read. Values are trimmed; empty or non-UTF-8
/// values count as absent. A mapped header sent more than once is refused. Header values never appear in logs or errors.
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    mapping: HeaderMapping,
}

impl HeaderResolver {
    pub fn new(mapping: HeaderMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &HeaderMapping {
        &self.mapping
    }

    #[track_caller]
    pub fn resolve(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Result<Identity> {
        let mut values: HashMap<CanonicalField, String> = HashMap::new();
        let mut repeated: Vec<String> = Vec::new();
        let mut any_sent = false;

        for (field, name) in self.mapping.headers() {
            let mut sent = headers.get_all(name).iter();
            let Some(first) = sent.next() else {
                continue;
            };
            // A client-supplied copy next to the proxy's value.
            if sent.next().is_some() {
                any_sent = true;
                repeated.push(field.to_string());
                continue;
            }
            let Ok(value) = first.to_str() else {
                continue;
            };
            any_sent = true;

            let value = value.trim();
            if !value.is_empty() {
                values.insert(*field, value.to_string());
            }
        }

        let missing: Vec<String> = self
            .mapping
            .required()
            .iter()
            .filter(|field| !values.contains_key(field))
            .map(|field| field.to_string())
            .collect();

        if !any_sent {
            debug!("No identity headers on request; upstream did not authenticate");
            return Err(AuthError::AuthenticationMissing {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !repeated.is_empty() {
            warn!(
                "Identity headers sent more than once: {}",
                repeated.join(", ")
            );
            return Err(AuthError::AuthenticationMalformed {
                fields: repeated,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !missing.is_empty() {
            return Err(malformed(missing));
        }

        let mut take = |field: CanonicalField| values.remove(&field).unwrap_or_default();
        let email = take(CanonicalField::Email);
        let username = take(CanonicalField::Username);
        let display_name = take(CanonicalField::DisplayName);
        let provider = take(CanonicalField::Provider);
        let groups = take(CanonicalField::Groups);
        let external_id = take(CanonicalField::ExternalId);

        if email.is_empty() && username.is_empty() {
            return Err(malformed(vec![
                CanonicalField::Email.to_string(),
                CanonicalField::Username.to_string(),
            ]));
        }

        let external_id = [external_id, username.clone(), email.clone()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .unwrap_or_default();

        let provider = if provider.is_empty() {
            self.mapping.default_provider().to_string()
        } else {
            provider
        };

        let groups = (!groups.is_empty()).then(|| self.split_groups(&groups));

        Ok(Identity {
            external_id,
            provider,
            email,
            username,
            display_name,
            groups,
            last_seen_at: now,
            source_event_at: None,
        })
    }

    fn split_groups(&self, raw: &str) -> Vec<String> {
        raw.split(self.mapping.groups_separator())
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .map(String::from)
            .collect()
    }
}

#[track_caller]
fn malformed(missing: Vec<String>) -> AuthError {
    // Field names only: a partial header set is either proxy misconfiguration
    // or someone bypassing the proxy.
    warn!(
        "Identity headers incomplete, missing or empty: {}",
        missing.join(", ")
    );
    AuthError::AuthenticationMalformed {
        fields: missing,
        location: ErrorLocation::from(Location::caller()),
    }
}
