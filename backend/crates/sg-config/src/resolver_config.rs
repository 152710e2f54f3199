use crate::{ConfigError, ConfigErrorResult, DEFAULT_PROVIDER};

use serde::Deserialize;

/// Fields an identity can be resolved from, in the order they are reported.
pub const CANONICAL_FIELDS: [&str; 6] = [
    "external_id",
    "provider",
    "email",
    "username",
    "display_name",
    "groups",
];

pub const DEFAULT_GROUPS_SEPARATOR: &str = "|";
pub const MAX_HEADER_NAME_LENGTH: usize = 128;

/// Header name per canonical field. An unset or empty entry means the
/// field is never read from the request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeaderMappingConfig {
    pub external_id: Option<String>,
    pub provider: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub groups: Option<String>,
}

impl Default for HeaderMappingConfig {
    fn default() -> Self {
        Self {
            external_id: Some(String::from("X-authentik-uid")),
            provider: None,
            email: Some(String::from("X-authentik-email")),
            username: Some(String::from("X-authentik-username")),
            display_name: Some(String::from("X-authentik-name")),
            groups: Some(String::from("X-authentik-groups")),
        }
    }
}

impl HeaderMappingConfig {
    /// Header configured for a canonical field, if any.
    pub fn header_for(&self, field: &str) -> Option<&str> {
        let header = match field {
            "external_id" => self.external_id.as_deref(),
            "provider" => self.provider.as_deref(),
            "email" => self.email.as_deref(),
            "username" => self.username.as_deref(),
            "display_name" => self.display_name.as_deref(),
            "groups" => self.groups.as_deref(),
            _ => None,
        };
        header.map(str::trim).filter(|h| !h.is_empty())
    }

    /// Mapped `(field, header)` pairs in canonical order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        CANONICAL_FIELDS
            .iter()
            .filter_map(|field| self.header_for(field).map(|header| (*field, header)))
            .collect()
    }

    pub(crate) fn slot_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "external_id" => Some(&mut self.external_id),
            "provider" => Some(&mut self.provider),
            "email" => Some(&mut self.email),
            "username" => Some(&mut self.username),
            "display_name" => Some(&mut self.display_name),
            "groups" => Some(&mut self.groups),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub headers: HeaderMappingConfig,
    /// Canonical fields that must be present and non-empty
    pub required: Vec<String>,
    /// Provider recorded when no provider header is mapped or sent
    pub default_provider: String,
    pub groups_separator: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            headers: HeaderMappingConfig::default(),
            required: vec![String::from("email"), String::from("username")],
            default_provider: String::from(DEFAULT_PROVIDER),
            groups_separator: String::from(DEFAULT_GROUPS_SEPARATOR),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for field in &self.required {
            if !CANONICAL_FIELDS.contains(&field.as_str()) {
                return Err(ConfigError::resolver(format!(
                    "resolver.required contains unknown field '{}' (expected one of {})",
                    field,
                    CANONICAL_FIELDS.join(", ")
                )));
            }
            if self.headers.header_for(field).is_none() {
                return Err(ConfigError::resolver(format!(
                    "resolver.required lists '{}' but resolver.headers.{} is not set",
                    field, field
                )));
            }
        }

        if self.headers.header_for("email").is_none()
            && self.headers.header_for("username").is_none()
        {
            return Err(ConfigError::resolver(
                "resolver.headers must map at least one of email or username",
            ));
        }

        for (field, header) in self.headers.entries() {
            if header.len() > MAX_HEADER_NAME_LENGTH || !header.bytes().all(is_token_byte) {
                return Err(ConfigError::resolver(format!(
                    "resolver.headers.{} is not a valid HTTP header name: '{}'",
                    field, header
                )));
            }
        }

        if self.default_provider.trim().is_empty() {
            return Err(ConfigError::resolver(
                "resolver.default_provider cannot be empty",
            ));
        }

        if self.groups_separator.is_empty() {
            return Err(ConfigError::resolver(
                "resolver.groups_separator cannot be empty",
            ));
        }

        Ok(())
    }
}

/// RFC 9110 token characters.
pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
