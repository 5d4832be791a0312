//! Lowering configuration

use serde::{Deserialize, Serialize};

/// Options for one lowering run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerConfig {
    /// Name given to the produced module
    pub module_name: String,

    /// Name of the implicit function wrapping top-level statements
    pub entry_function: String,

    /// Pre-register the runtime's `echo(value)` function
    pub core_functions: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            module_name: "toyc".to_string(),
            entry_function: "main".to_string(),
            core_functions: false,
        }
    }
}

/// Error reading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed TOML or unknown keys
    #[error("invalid lowering configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LowerConfig {
    /// Parse a configuration from TOML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed input or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = LowerConfig::from_toml_str("core_functions = true\n").unwrap();
        assert!(config.core_functions);
        assert_eq!(config.module_name, "toyc");
        assert_eq!(config.entry_function, "main");
    }

    #[test]
    fn test_full_toml() {
        let config = LowerConfig::from_toml_str(
            "module_name = \"demo\"\nentry_function = \"start\"\ncore_functions = false\n",
        )
        .unwrap();
        assert_eq!(
            config,
            LowerConfig {
                module_name: "demo".to_string(),
                entry_function: "start".to_string(),
                core_functions: false,
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let error = LowerConfig::from_toml_str("optimize = true\n").unwrap_err();
        assert!(error.to_string().starts_with("invalid lowering configuration"));
    }
}
