//! Adapter configuration (`[adapter]` table of a TOML file)

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading adapter options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// What the dispatch resolver does when a foreign type name matches none of
/// a polymorphic property's declared alternatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// Fail with `TypeMismatch`
    #[default]
    Strict,
    /// Convert with the declared base type and log a warning
    FallbackToDeclared,
}

/// Options shared by every adapter in a registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterOptions {
    /// Module foreign types are promoted into when `implement` gets none
    pub default_module: String,

    /// Failure policy for unmatched derived dispatch
    pub dispatch_policy: DispatchPolicy,

    /// Bracket box/unbox/implement with a GC pause
    pub pause_gc: bool,
}

fn default_module() -> String {
    "Main".to_string()
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            default_module: default_module(),
            dispatch_policy: DispatchPolicy::default(),
            pause_gc: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    adapter: AdapterOptions,
}

impl AdapterOptions {
    /// Parse options from TOML text containing an optional `[adapter]` table
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.adapter.validate()?;
        Ok(file.adapter)
    }

    /// Load options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_module.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_module cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
