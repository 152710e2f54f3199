use serde::Deserialize;

/// Read-only inspection endpoints for the shadow store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,
}
