use crate::{AuthError, CanonicalField, Result};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use http::HeaderName;

pub const DEFAULT_GROUPS_SEPARATOR: &str = "|";

/// Which trusted header carries each identity field, and which fields a
/// request must carry to be authenticated.
#[derive(Debug, Clone)]
pub struct HeaderMapping {
    headers: Vec<(CanonicalField, HeaderName)>,
    required: Vec<CanonicalField>,
    default_provider: String,
    groups_separator: String,
}

impl HeaderMapping {
    /// Build from `(field, header)` pairs and required field names.
    #[track_caller]
    pub fn new<F, H, R>(
        headers: impl IntoIterator<Item = (F, H)>,
        required: impl IntoIterator<Item = R>,
        default_provider: impl Into<String>,
    ) -> Result<Self>
    where
        F: AsRef<str>,
        H: AsRef<str>,
        R: AsRef<str>,
    {
        let mut mapped: Vec<(CanonicalField, HeaderName)> = Vec::new();
        for (field, header) in headers {
            let field = parse_field(field.as_ref())?;
            let name = HeaderName::from_str(header.as_ref().trim()).map_err(|e| {
                AuthError::InvalidMapping {
                    field: field.to_string(),
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;
            mapped.retain(|(existing, _)| *existing != field);
            mapped.push((field, name));
        }
        mapped.sort_by_key(|(field, _)| *field);

        let mut required_fields = Vec::new();
        for name in required {
            let field = parse_field(name.as_ref())?;
            if !mapped.iter().any(|(f, _)| *f == field) {
                return Err(AuthError::InvalidMapping {
                    field: field.to_string(),
                    message: "required but no header is mapped".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            if !required_fields.contains(&field) {
                required_fields.push(field);
            }
        }
        required_fields.sort();

        Ok(Self {
            headers: mapped,
            required: required_fields,
            default_provider: default_provider.into(),
            groups_separator: DEFAULT_GROUPS_SEPARATOR.to_string(),
        })
    }

    pub fn with_groups_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        if !separator.is_empty() {
            self.groups_separator = separator;
        }
        self
    }

    /// Mapped headers in canonical field order.
    pub fn headers(&self) -> &[(CanonicalField, HeaderName)] {
        &self.headers
    }

    pub fn required(&self) -> &[CanonicalField] {
        &self.required
    }

    pub fn header_for(&self, field: CanonicalField) -> Option<&HeaderName> {
        self.headers
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, name)| name)
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn groups_separator(&self) -> &str {
        &self.groups_separator
    }
}

#[track_caller]
fn parse_field(name: &str) -> Result<CanonicalField> {
    CanonicalField::from_str(name.trim()).map_err(|message| AuthError::InvalidMapping {
        field: name.to_string(),
        message,
        location: ErrorLocation::from(Location::caller()),
    })
}
