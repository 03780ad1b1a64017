//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every field is optional. A [`ConfigLayer`] only records what one source
//! (a config file or a set of overrides) says; defaults are applied when
//! the layers are resolved into a [`Settings`](crate::core::settings::Settings)
//! snapshot.
//!
//! # Example
//!
//! ```toml
//! verbose = true
//!
//! [git]
//! abbrev_length = 10
//! evaluate_on_commit = "HEAD~1"
//!
//! [git.describe]
//! tags = true
//!
//! [format]
//! property_prefix = "build.git"
//!
//! [filter]
//! exclude_properties = ["git\\.build\\.user\\..*"]
//!
//! [output]
//! generate_output_file = true
//! output_format = "json"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One layer of configuration (a file or a set of overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// Forward extractor log output
    pub verbose: Option<bool>,

    /// Skip the generation task entirely
    pub skip: Option<bool>,

    /// Repository and extraction settings
    pub git: GitOptions,

    /// Property naming and date formatting
    pub format: FormatOptions,

    /// Include/exclude rules
    pub filter: FilterOptions,

    /// Output file settings
    pub output: OutputOptions,
}

impl ConfigLayer {
    /// Overlay `over` on top of this layer.
    ///
    /// Values set in `over` replace values in `self`. Lists are replaced
    /// wholesale, never concatenated.
    pub fn merge(&mut self, over: ConfigLayer) {
        overlay(&mut self.verbose, over.verbose);
        overlay(&mut self.skip, over.skip);
        self.git.merge(over.git);
        self.format.merge(over.format);
        self.filter.merge(over.filter);
        self.output.merge(over.output);
    }
}

/// `[git]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitOptions {
    /// Location of the `.git` directory (relative to the project base dir)
    pub dot_git_directory: Option<PathBuf>,

    /// Commit reference to describe
    pub evaluate_on_commit: Option<String>,

    /// Length of abbreviated commit ids
    pub abbrev_length: Option<i64>,

    /// Fail when the `.git` directory is missing
    pub fail_on_no_git_directory: Option<bool>,

    /// Fail when the repository cannot be read
    pub fail_on_unable_to_extract_repo_info: Option<bool>,

    /// Use the native git binary instead of an embedded implementation
    pub use_native_git: Option<bool>,

    /// Timeout for native git invocations, in milliseconds
    pub native_git_timeout_ms: Option<i64>,

    /// Do not contact remotes
    pub offline: Option<bool>,

    /// Prefer the branch name reported by CI environment variables
    pub use_branch_name_from_build_environment: Option<bool>,

    /// `git describe` settings
    pub describe: DescribeOptions,
}

impl GitOptions {
    fn merge(&mut self, over: GitOptions) {
        overlay(&mut self.dot_git_directory, over.dot_git_directory);
        overlay(&mut self.evaluate_on_commit, over.evaluate_on_commit);
        overlay(&mut self.abbrev_length, over.abbrev_length);
        overlay(
            &mut self.fail_on_no_git_directory,
            over.fail_on_no_git_directory,
        );
        overlay(
            &mut self.fail_on_unable_to_extract_repo_info,
            over.fail_on_unable_to_extract_repo_info,
        );
        overlay(&mut self.use_native_git, over.use_native_git);
        overlay(&mut self.native_git_timeout_ms, over.native_git_timeout_ms);
        overlay(&mut self.offline, over.offline);
        overlay(
            &mut self.use_branch_name_from_build_environment,
            over.use_branch_name_from_build_environment,
        );
        self.describe.merge(over.describe);
    }
}

/// `[git.describe]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DescribeOptions {
    /// Do not compute a describe string
    pub skip: Option<bool>,

    /// Fall back to the abbreviated commit id when no tag is reachable
    pub always: Option<bool>,

    /// Abbreviation length inside the describe string (0 disables the hash)
    pub abbrev: Option<i64>,

    /// Suffix appended for a dirty working tree
    pub dirty: Option<String>,

    /// Tag glob to consider
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,

    /// Consider lightweight tags
    pub tags: Option<bool>,

    /// Always emit the long format
    pub force_long_format: Option<bool>,
}

impl DescribeOptions {
    fn merge(&mut self, over: DescribeOptions) {
        overlay(&mut self.skip, over.skip);
        overlay(&mut self.always, over.always);
        overlay(&mut self.abbrev, over.abbrev);
        overlay(&mut self.dirty, over.dirty);
        overlay(&mut self.match_pattern, over.match_pattern);
        overlay(&mut self.tags, over.tags);
        overlay(&mut self.force_long_format, over.force_long_format);
    }
}

/// `[format]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    /// Namespace prefix for property keys
    pub property_prefix: Option<String>,

    /// Date format handed to the extractor
    pub date_format: Option<String>,

    /// Time zone id for formatted dates
    pub date_format_time_zone: Option<String>,
}

impl FormatOptions {
    fn merge(&mut self, over: FormatOptions) {
        overlay(&mut self.property_prefix, over.property_prefix);
        overlay(&mut self.date_format, over.date_format);
        overlay(&mut self.date_format_time_zone, over.date_format_time_zone);
    }
}

/// `[filter]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FilterOptions {
    /// Regex rules; matching keys are dropped
    pub exclude_properties: Option<Vec<String>>,

    /// Regex rules; when non-empty only matching keys are kept
    pub include_only_properties: Option<Vec<String>>,
}

impl FilterOptions {
    fn merge(&mut self, over: FilterOptions) {
        overlay(&mut self.exclude_properties, over.exclude_properties);
        overlay(
            &mut self.include_only_properties,
            over.include_only_properties,
        );
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// Ask the extractor to write the properties file
    pub generate_output_file: Option<bool>,

    /// Properties file location (relative to the project base dir)
    pub output_file: Option<PathBuf>,

    /// Serialization format of the properties file
    pub output_format: Option<OutputFormat>,

    /// Escape non-ASCII characters in `.properties` output
    pub escape_unicode: Option<bool>,

    /// Character encoding of the properties file
    pub source_charset: Option<String>,
}

impl OutputOptions {
    fn merge(&mut self, over: OutputOptions) {
        overlay(&mut self.generate_output_file, over.generate_output_file);
        overlay(&mut self.output_file, over.output_file);
        overlay(&mut self.output_format, over.output_format);
        overlay(&mut self.escape_unicode, over.escape_unicode);
        overlay(&mut self.source_charset, over.source_charset);
    }
}

/// Serialization format of the generated properties file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Java-style `key=value` properties
    #[default]
    Properties,
    /// A flat JSON object
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Properties => write!(f, "properties"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

fn overlay<T>(base: &mut Option<T>, over: Option<T>) {
    if over.is_some() {
        *base = over;
    }
}
