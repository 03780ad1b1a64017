//! extract::traits
//!
//! The boundary between gitstamp and an external metadata extractor.
//!
//! # Design
//!
//! An [`Extractor`] reads repository metadata and returns a flat
//! [`PropertyMap`]. It pulls every setting it needs through an
//! [`ExtractionCallback`] instead of receiving a settings struct, so the
//! set of values crossing the boundary is fixed by this trait and nothing
//! else. Extractors report failure with [`ExtractError`]; deciding whether
//! a failure is fatal is the adapter's job, not the extractor's.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::OutputFormat;
use crate::core::settings::DescribeConfig;
use crate::core::types::PropertyMap;

/// Failures reported by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The configured `.git` directory does not exist.
    #[error("no git directory at '{path}'")]
    NoGitDirectory {
        /// Directory that was checked
        path: PathBuf,
    },

    /// The repository could not be read.
    #[error("{message}")]
    Execution {
        /// What went wrong
        message: String,
    },

    /// A native git invocation exceeded the configured timeout.
    #[error("native git timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that was exceeded
        timeout_ms: u64,
    },
}

impl ExtractError {
    /// Convenience constructor for [`ExtractError::Execution`].
    pub fn execution(message: impl Into<String>) -> Self {
        ExtractError::Execution {
            message: message.into(),
        }
    }
}

/// Log sink handed to the extractor.
pub trait ExtractorLog {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Read-only accessors the extractor uses to obtain its settings.
pub trait ExtractionCallback {
    /// The `.git` directory to read.
    fn dot_git_directory(&self) -> &Path;

    /// Commit reference to evaluate (e.g. `HEAD`).
    fn evaluate_on_commit(&self) -> &str;

    /// Abbreviated commit id length.
    fn abbrev_length(&self) -> u8;

    /// Date format for time properties.
    fn date_format(&self) -> &str;

    /// Time zone id for time properties.
    fn date_format_time_zone(&self) -> &str;

    /// Key prefix including its trailing separator, or `""`.
    fn prefix_dot(&self) -> &str;

    /// `git describe` configuration.
    fn describe(&self) -> &DescribeConfig;

    /// Use the native git binary instead of an embedded implementation.
    fn use_native_git(&self) -> bool;

    /// Timeout for each native git invocation.
    fn native_git_timeout(&self) -> Duration;

    /// Do not contact remotes.
    fn is_offline(&self) -> bool;

    /// Prefer the branch name reported by CI environment variables.
    fn use_branch_name_from_build_environment(&self) -> bool;

    /// Include-only rules, as configured.
    fn include_only_properties(&self) -> &[String];

    /// Exclude rules, as configured.
    fn exclude_properties(&self) -> &[String];

    /// Whether the extractor should write the properties file.
    fn should_generate_output_file(&self) -> bool;

    /// Where the properties file goes.
    fn output_file(&self) -> &Path;

    /// Serialization format of the properties file.
    fn output_format(&self) -> OutputFormat;

    /// Escape non-ASCII characters in `.properties` output.
    fn escape_unicode(&self) -> bool;

    /// Character encoding of the properties file.
    fn source_charset(&self) -> &str;

    /// Name of the project being built.
    fn project_name(&self) -> &str;

    /// Base directory of the project being built.
    fn project_base_dir(&self) -> &Path;

    /// Version of the project being built, if known.
    fn project_version(&self) -> Option<&str>;

    /// Look up a build environment variable.
    fn env_var(&self, name: &str) -> Option<&str>;

    /// Timestamp to report as the build time.
    fn reproducible_build_timestamp(&self) -> DateTime<Utc>;

    /// Where extractor diagnostics go.
    fn log(&self) -> &dyn ExtractorLog;
}

/// An external source of git metadata.
pub trait Extractor: Send + Sync {
    /// Extract properties for the repository described by `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the repository is missing or cannot
    /// be read.
    fn extract(&self, callback: &dyn ExtractionCallback) -> Result<PropertyMap, ExtractError>;
}

/// Owned, serializable copy of everything an [`ExtractionCallback`]
/// exposes (apart from the environment and the log sink).
///
/// Used as the wire format for out-of-process extractors and as the
/// recorded request of the mock extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub dot_git_directory: PathBuf,
    pub evaluate_on_commit: String,
    pub abbrev_length: u8,
    pub date_format: String,
    pub date_format_time_zone: String,
    pub prefix_dot: String,
    pub describe: DescribeConfig,
    pub use_native_git: bool,
    pub native_git_timeout_ms: u64,
    pub offline: bool,
    pub use_branch_name_from_build_environment: bool,
    pub include_only_properties: Vec<String>,
    pub exclude_properties: Vec<String>,
    pub generate_output_file: bool,
    pub output_file: PathBuf,
    pub output_format: OutputFormat,
    pub escape_unicode: bool,
    pub source_charset: String,
    pub project_name: String,
    pub project_base_dir: PathBuf,
    pub project_version: Option<String>,
    pub reproducible_build_timestamp: DateTime<Utc>,
}

impl ExtractionRequest {
    /// Read every accessor of `callback` once.
    pub fn from_callback(callback: &dyn ExtractionCallback) -> Self {
        Self {
            dot_git_directory: callback.dot_git_directory().to_path_buf(),
            evaluate_on_commit: callback.evaluate_on_commit().to_string(),
            abbrev_length: callback.abbrev_length(),
            date_format: callback.date_format().to_string(),
            date_format_time_zone: callback.date_format_time_zone().to_string(),
            prefix_dot: callback.prefix_dot().to_string(),
            describe: callback.describe().clone(),
            use_native_git: callback.use_native_git(),
            native_git_timeout_ms: u64::try_from(callback.native_git_timeout().as_millis())
                .unwrap_or(u64::MAX),
            offline: callback.is_offline(),
            use_branch_name_from_build_environment: callback
                .use_branch_name_from_build_environment(),
            include_only_properties: callback.include_only_properties().to_vec(),
            exclude_properties: callback.exclude_properties().to_vec(),
            generate_output_file: callback.should_generate_output_file(),
            output_file: callback.output_file().to_path_buf(),
            output_format: callback.output_format(),
            escape_unicode: callback.escape_unicode(),
            source_charset: callback.source_charset().to_string(),
            project_name: callback.project_name().to_string(),
            project_base_dir: callback.project_base_dir().to_path_buf(),
            project_version: callback.project_version().map(str::to_string),
            reproducible_build_timestamp: callback.reproducible_build_timestamp(),
        }
    }
}
