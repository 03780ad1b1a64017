//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitstamp reads configuration from several layers:
//! - **Global**: User-level settings shared by all projects
//! - **Project**: Settings checked in next to the project
//! - **Overrides**: Values supplied by the caller (e.g. CLI flags)
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values (applied by [`Settings`](crate::core::settings::Settings))
//! 2. Global config file
//! 3. Project config file
//! 4. Overrides
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITSTAMP_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitstamp/config.toml`
//! 3. `~/.gitstamp/config.toml`
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `<base>/gitstamp.toml` (canonical)
//! 2. `<base>/.gitstamp.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use gitstamp::core::config::{Config, ConfigLayer};
//! use std::path::Path;
//!
//! let result = Config::load(Path::new("/path/to/project")).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//!
//! let mut overrides = ConfigLayer::default();
//! overrides.verbose = Some(true);
//! let config = result.config.with_overrides(overrides);
//! assert_eq!(config.merged().verbose, Some(true));
//! ```

pub mod schema;

pub use schema::{
    ConfigLayer, DescribeOptions, FilterOptions, FormatOptions, GitOptions, OutputFormat,
    OutputOptions,
};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::filter::RuleError;
use super::paths::StampPaths;

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

    #[error(transparent)]
    InvalidRule(#[from] RuleError),
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

/// Layered configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigLayer,
    /// Project configuration (if a project file was found)
    pub project: Option<ConfigLayer>,
    /// Caller-supplied overrides
    pub overrides: ConfigLayer,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be read or parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(base_dir: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global()?;
        let (project, project_path) = Self::load_project(base_dir, &mut warnings)?;

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                overrides: ConfigLayer::default(),
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Build a configuration from explicit layers, without touching the
    /// filesystem.
    pub fn from_layers(global: ConfigLayer, project: Option<ConfigLayer>) -> Self {
        Self {
            global,
            project,
            ..Default::default()
        }
    }

    /// Replace the override layer.
    pub fn with_overrides(mut self, overrides: ConfigLayer) -> Self {
        self.overrides = overrides;
        self
    }

    /// Use `path` as the project layer instead of the discovered one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn with_project_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        self.project = Some(Self::read_file(path)?);
        self.project_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Merge all layers in precedence order.
    pub fn merged(&self) -> ConfigLayer {
        let mut merged = self.global.clone();
        if let Some(project) = &self.project {
            merged.merge(project.clone());
        }
        merged.merge(self.overrides.clone());
        merged
    }

    /// Path of the global config file, if one was loaded.
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path of the project config file, if one was loaded.
    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(ConfigLayer, Option<PathBuf>), ConfigError> {
        // 1. Check $GITSTAMP_CONFIG
        if let Ok(path) = std::env::var("GITSTAMP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_file(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/gitstamp/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitstamp/config.toml");
            if path.exists() {
                let config = Self::read_file(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.gitstamp/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".gitstamp/config.toml");
            if path.exists() {
                let config = Self::read_file(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((ConfigLayer::default(), None))
    }

    /// Load project configuration from standard locations.
    fn load_project(
        base_dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<ConfigLayer>, Option<PathBuf>), ConfigError> {
        let paths = StampPaths::new(base_dir);

        let canonical = paths.project_config_path();
        if canonical.exists() {
            let config = Self::read_file(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        let compat = paths.compat_project_config_path();
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please rename to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = Self::read_file(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] or [`ConfigError::ParseError`].
    pub fn read_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write project config atomically.
    ///
    /// Uses a temp file and rename so a crash never leaves a truncated file.
    pub fn write_project(base_dir: &Path, config: &ConfigLayer) -> Result<PathBuf, ConfigError> {
        let path = StampPaths::new(base_dir).project_config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic(path: &Path, config: &ConfigLayer) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

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
}
