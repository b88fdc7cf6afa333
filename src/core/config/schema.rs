//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$CELLSCRIPT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cellscript/config.toml`
//! 3. `~/.cellscript/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `.cellscript/config.toml` (canonical) in the working directory.
//!
//! # Validation
//!
//! Config values are validated after parsing: the delimiter must be a valid
//! two-marker delimiter and every library entry must be registrable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{Delimiter, LibraryName};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// warnings = true
/// delimiter = "$$"
/// safe_substitute = true
///
/// [sanitize]
/// allow_private = false
/// blacklist = ["api_token"]
///
/// [libraries]
/// d3 = "https://d3js.org/d3.v5.min"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Report namespace entries skipped during sanitization
    pub warnings: Option<bool>,

    /// Placeholder delimiter (default: "$$")
    pub delimiter: Option<String>,

    /// Leave unresolved placeholders in place instead of failing
    pub safe_substitute: Option<bool>,

    /// Sanitizer defaults
    pub sanitize: Option<SanitizeDefaults>,

    /// Libraries linked in every session
    pub libraries: Option<IndexMap<String, String>>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(delimiter) = &self.delimiter {
            Delimiter::new(delimiter).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }

        if let Some(sanitize) = &self.sanitize {
            sanitize.validate()?;
        }

        if let Some(libraries) = &self.libraries {
            validate_libraries(libraries)?;
        }

        Ok(())
    }
}

/// Project configuration (working-directory scope).
///
/// # Example
///
/// ```toml
/// require = ["d3"]
///
/// [libraries]
/// c3 = "/static/c3.min"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Libraries required by scripts when none are given explicitly
    pub require: Option<Vec<String>>,

    /// Project-specific libraries, merged over the global ones
    pub libraries: Option<IndexMap<String, String>>,

    /// Sanitizer overrides
    pub sanitize: Option<SanitizeDefaults>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(libraries) = &self.libraries {
            validate_libraries(libraries)?;
        }

        if let Some(sanitize) = &self.sanitize {
            sanitize.validate()?;
        }

        Ok(())
    }
}

/// Sanitizer defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizeDefaults {
    /// Keep `_`-prefixed variables
    pub allow_private: Option<bool>,

    /// Variables never embedded
    pub blacklist: Option<Vec<String>>,

    /// Maximum JSON size of a single embedded value, in bytes
    pub max_value_bytes: Option<usize>,
}

impl SanitizeDefaults {
    /// Validate the sanitizer settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_value_bytes == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sanitize.max_value_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_libraries(libraries: &IndexMap<String, String>) -> Result<(), ConfigError> {
    for (name, location) in libraries {
        LibraryName::new(name.as_str()).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        if location.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "library '{}' has an empty location",
                name
            )));
        }
    }
    Ok(())
}
