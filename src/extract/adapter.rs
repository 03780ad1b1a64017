//! extract::adapter
//!
//! Translation between a [`Settings`] snapshot and an [`Extractor`].
//!
//! # Responsibilities
//!
//! - Expose the snapshot through the [`ExtractionCallback`] accessors
//! - Invoke the extractor once per call
//! - Decide which extractor failures are fatal
//!
//! The adapter keeps no state between calls and neither caches nor
//! filters; memoization lives in the result publisher.
//!
//! # Failure policy
//!
//! | Extractor reports | Setting                                   | Outcome          |
//! |-------------------|-------------------------------------------|------------------|
//! | missing `.git`    | `fail_on_no_git_directory = true`         | fatal            |
//! | missing `.git`    | `fail_on_no_git_directory = false`        | empty map        |
//! | any other error   | `fail_on_unable_to_extract_repo_info = true`  | fatal        |
//! | any other error   | `fail_on_unable_to_extract_repo_info = false` | empty map    |

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::log::TracingLog;
use super::traits::{ExtractError, ExtractionCallback, Extractor, ExtractorLog};
use crate::core::config::OutputFormat;
use crate::core::settings::{DescribeConfig, Settings};
use crate::core::types::PropertyMap;

/// Fatal extraction failures.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// The `.git` directory is missing and that is configured to be fatal.
    #[error(
        "no git directory at '{path}' (evaluating '{reference}'); \
         set git.fail_on_no_git_directory = false to build without git properties"
    )]
    NoGitDirectory {
        /// Directory that was checked
        path: PathBuf,
        /// Reference that was requested
        reference: String,
    },

    /// The extractor failed for any other reason.
    #[error("failed to extract git properties from '{path}' at '{reference}': {source}")]
    Extraction {
        /// Directory that was read
        path: PathBuf,
        /// Reference that was requested
        reference: String,
        /// What the extractor reported
        #[source]
        source: ExtractError,
    },
}

/// [`ExtractionCallback`] over a settings snapshot.
pub struct SettingsCallback<'a> {
    settings: &'a Settings,
    prefix_dot: String,
    build_timestamp: DateTime<Utc>,
    log: TracingLog,
}

impl<'a> SettingsCallback<'a> {
    /// Wrap a snapshot.
    ///
    /// The build timestamp is fixed here: `SOURCE_DATE_EPOCH` if it was
    /// set, otherwise the current time.
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            prefix_dot: settings.format.prefix_dot(),
            build_timestamp: settings.build_timestamp.unwrap_or_else(Utc::now),
            log: TracingLog::new(settings.verbose),
        }
    }
}

impl ExtractionCallback for SettingsCallback<'_> {
    fn dot_git_directory(&self) -> &Path {
        &self.settings.git.dot_git_directory
    }

    fn evaluate_on_commit(&self) -> &str {
        &self.settings.git.evaluate_on_commit
    }

    fn abbrev_length(&self) -> u8 {
        self.settings.git.abbrev_length
    }

    fn date_format(&self) -> &str {
        &self.settings.format.date_format
    }

    fn date_format_time_zone(&self) -> &str {
        &self.settings.format.date_format_time_zone
    }

    fn prefix_dot(&self) -> &str {
        &self.prefix_dot
    }

    fn describe(&self) -> &DescribeConfig {
        &self.settings.git.describe
    }

    fn use_native_git(&self) -> bool {
        self.settings.git.use_native_git
    }

    fn native_git_timeout(&self) -> Duration {
        self.settings.git.native_git_timeout()
    }

    fn is_offline(&self) -> bool {
        self.settings.git.offline
    }

    fn use_branch_name_from_build_environment(&self) -> bool {
        self.settings.git.use_branch_name_from_build_environment
    }

    fn include_only_properties(&self) -> &[String] {
        &self.settings.filter.include_only_properties
    }

    fn exclude_properties(&self) -> &[String] {
        &self.settings.filter.exclude_properties
    }

    fn should_generate_output_file(&self) -> bool {
        self.settings.output.generate_output_file
    }

    fn output_file(&self) -> &Path {
        &self.settings.output.output_file
    }

    fn output_format(&self) -> OutputFormat {
        self.settings.output.output_format
    }

    fn escape_unicode(&self) -> bool {
        self.settings.output.escape_unicode
    }

    fn source_charset(&self) -> &str {
        &self.settings.output.source_charset
    }

    fn project_name(&self) -> &str {
        &self.settings.project.name
    }

    fn project_base_dir(&self) -> &Path {
        &self.settings.project.base_dir
    }

    fn project_version(&self) -> Option<&str> {
        self.settings.project.version.as_deref()
    }

    fn env_var(&self, name: &str) -> Option<&str> {
        self.settings.project.env_var(name)
    }

    fn reproducible_build_timestamp(&self) -> DateTime<Utc> {
        self.build_timestamp
    }

    fn log(&self) -> &dyn ExtractorLog {
        &self.log
    }
}

/// Run `extractor` against `settings`.
///
/// Returns the raw property map; filtering and stabilization happen
/// later.
///
/// # Errors
///
/// Returns [`ExtractionFailure`] when the extractor fails and the
/// configuration says that failure is fatal.
pub fn extract(extractor: &dyn Extractor, settings: &Settings) -> Result<PropertyMap, ExtractionFailure> {
    let callback = SettingsCallback::new(settings);
    let git = &settings.git;

    tracing::debug!(
        git_dir = %git.dot_git_directory.display(),
        reference = %git.evaluate_on_commit,
        "Executing extractor to gather git properties"
    );

    match extractor.extract(&callback) {
        Ok(props) => {
            tracing::debug!(count = props.len(), "Extractor returned properties");
            Ok(props)
        }
        Err(ExtractError::NoGitDirectory { path }) => {
            if git.fail_on_no_git_directory {
                Err(ExtractionFailure::NoGitDirectory {
                    path,
                    reference: git.evaluate_on_commit.clone(),
                })
            } else {
                tracing::info!(
                    "No git directory at '{}'; continuing without git properties",
                    path.display()
                );
                Ok(PropertyMap::new())
            }
        }
        Err(source) => {
            if git.fail_on_unable_to_extract_repo_info {
                Err(ExtractionFailure::Extraction {
                    path: git.dot_git_directory.clone(),
                    reference: git.evaluate_on_commit.clone(),
                    source,
                })
            } else {
                tracing::warn!(
                    "Unable to extract git properties ({}); continuing without them",
                    source
                );
                Ok(PropertyMap::new())
            }
        }
    }
}
