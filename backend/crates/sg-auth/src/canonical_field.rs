use std::fmt;
use std::str::FromStr;

/// Identity attribute the resolver can read from a trusted header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    ExternalId,
    Provider,
    Email,
    Username,
    DisplayName,
    Groups,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        Self::ExternalId,
        Self::Provider,
        Self::Email,
        Self::Username,
        Self::DisplayName,
        Self::Groups,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalId => "external_id",
            Self::Provider => "provider",
            Self::Email => "email",
            Self::Username => "username",
            Self::DisplayName => "display_name",
            Self::Groups => "groups",
        }
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown identity field: {}", s))
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
