use serde::Deserialize;

/// Process-wide mutation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Expose reverse foreign key relations as mutation input fields.
    pub include_reverse_relations: bool,
    /// Report permission denials in the payload errors instead of failing the request.
    pub swallow_permission_denied: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_reverse_relations: true,
            swallow_permission_denied: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(toml: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml)
    }
}
