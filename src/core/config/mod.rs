//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! cellscript has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Working-directory overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values (including the built-in d3 libraries)
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$CELLSCRIPT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cellscript/config.toml`
//! 3. `~/.cellscript/config.toml` (canonical write location)
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `.cellscript/config.toml` (canonical)
//! 2. `cellscript.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use cellscript::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Delimiter: {}", config.delimiter());
//! for (name, location) in config.libraries() {
//!     println!("{} -> {}", name, location);
//! }
//! ```

pub mod schema;

pub use schema::{GlobalConfig, ProjectConfig, SanitizeDefaults};

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::sanitize::SanitizeOptions;
use crate::core::template::SubstitutionMode;
use crate::core::types::Delimiter;

/// Libraries linked when nothing else is configured.
pub const DEFAULT_LIBRARIES: &[(&str, &str)] = &[
    ("d3", "https://d3js.org/d3.v5.min"),
    ("d3-hierarchy", "https://d3js.org/d3-hierarchy.v1.min"),
];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules automatically: project config
/// overrides global config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if found)
    pub project: Option<ProjectConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads project config from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;

        let (project, project_path) = if let Some(dir) = project_dir {
            Self::load_project(dir, &mut warnings)?
        } else {
            (None, None)
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("CELLSCRIPT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("cellscript/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".cellscript/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Load project configuration from `dir`.
    fn load_project(
        dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<ProjectConfig>, Option<PathBuf>), ConfigError> {
        let canonical = Self::project_config_path(dir);
        if canonical.exists() {
            let config = Self::read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        let compat = dir.join("cellscript.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = Self::read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    /// Read and parse a config file.
    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.cellscript/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".cellscript/config.toml"))
    }

    /// Where `config set` writes global settings.
    ///
    /// The file that was loaded, else `$CELLSCRIPT_CONFIG`, else the
    /// canonical location.
    pub fn global_write_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.global_path {
            return Ok(path.clone());
        }
        if let Ok(path) = std::env::var("CELLSCRIPT_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        Self::global_config_path()
    }

    /// Get the canonical path for project config.
    ///
    /// Returns `.cellscript/config.toml` relative to the given directory.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".cellscript/config.toml")
    }

    /// Write global config atomically to `path`.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_global(path: &Path, config: &GlobalConfig) -> Result<(), ConfigError> {
        config.validate()?;
        Self::write_config_atomic(path, config)
    }

    /// Write project config atomically.
    pub fn write_project(dir: &Path, config: &ProjectConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::project_config_path(dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Write to temp file in same directory (for atomic rename)
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Check if sanitizer warnings are enabled.
    ///
    /// Defaults to `false` if not configured.
    pub fn warnings(&self) -> bool {
        self.global.warnings.unwrap_or(false)
    }

    /// Get the placeholder delimiter.
    ///
    /// Defaults to `$$`. Loaded configs are validated, so a configured value
    /// always parses.
    pub fn delimiter(&self) -> Delimiter {
        self.global
            .delimiter
            .as_deref()
            .and_then(|d| Delimiter::new(d).ok())
            .unwrap_or_default()
    }

    /// Get the substitution mode.
    ///
    /// Defaults to safe substitution.
    pub fn substitution_mode(&self) -> SubstitutionMode {
        SubstitutionMode::from_safe_flag(self.global.safe_substitute.unwrap_or(true))
    }

    fn sanitize_setting<T>(&self, get: impl Fn(&SanitizeDefaults) -> Option<T>) -> Option<T> {
        self.project
            .as_ref()
            .and_then(|p| p.sanitize.as_ref())
            .and_then(&get)
            .or_else(|| self.global.sanitize.as_ref().and_then(&get))
    }

    /// Check if private variables may be embedded.
    ///
    /// Defaults to `false` if not configured.
    pub fn allow_private(&self) -> bool {
        self.sanitize_setting(|s| s.allow_private).unwrap_or(false)
    }

    /// Get the sanitizer blacklist: global and project lists combined.
    pub fn blacklist(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let lists = [
            self.global.sanitize.as_ref(),
            self.project.as_ref().and_then(|p| p.sanitize.as_ref()),
        ];
        for list in lists.into_iter().flatten().filter_map(|s| s.blacklist.as_ref()) {
            for name in list {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Get the per-value size limit, if any.
    pub fn max_value_bytes(&self) -> Option<usize> {
        self.sanitize_setting(|s| s.max_value_bytes)
    }

    /// Sanitizer options derived from configuration (no bindings).
    pub fn sanitize_options(&self) -> SanitizeOptions {
        SanitizeOptions {
            bindings: Default::default(),
            blacklist: self.blacklist().into_iter().collect::<HashSet<_>>(),
            allow_private: self.allow_private(),
            max_value_bytes: self.max_value_bytes(),
        }
    }

    /// Get the libraries to register, in order.
    ///
    /// Built-in defaults first, then global, then project entries; a later
    /// entry for the same name replaces the location in place.
    pub fn libraries(&self) -> Vec<(String, String)> {
        let mut merged: IndexMap<String, String> = DEFAULT_LIBRARIES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let sources = [
            self.global.libraries.as_ref(),
            self.project.as_ref().and_then(|p| p.libraries.as_ref()),
        ];
        for libraries in sources.into_iter().flatten() {
            for (name, location) in libraries {
                merged.insert(name.clone(), location.clone());
            }
        }

        merged.into_iter().collect()
    }

    /// Get the project's default requirements, if configured.
    pub fn default_requirements(&self) -> Option<&[String]> {
        self.project
            .as_ref()
            .and_then(|p| p.require.as_deref())
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}
