//! core::settings
//!
//! The resolved, immutable settings snapshot.
//!
//! # Overview
//!
//! [`Settings`] is built once per build from the merged configuration
//! layers and the [`ProjectContext`]. Every option has a default, every
//! value is validated here, and nothing changes afterwards: the engine
//! shares the snapshot behind an `Arc` and hands the extractor read-only
//! accessors over it.
//!
//! # Validation
//!
//! - `git.abbrev_length` must be in `1..=40`
//! - `git.describe.abbrev` must be `0` or in `2..=40`
//! - `git.native_git_timeout_ms` must be positive
//! - `git.evaluate_on_commit` must not be empty
//! - every filter rule must compile as a regex
//! - `SOURCE_DATE_EPOCH`, when present, must be integer seconds
//!
//! # Example
//!
//! ```
//! use gitstamp::core::config::{Config, ConfigLayer};
//! use gitstamp::core::settings::{ProjectContext, Settings};
//!
//! let mut layer = ConfigLayer::default();
//! layer.format.property_prefix = Some("  ".to_string());
//! layer.git.dot_git_directory = Some(".git".into());
//!
//! let config = Config::from_layers(layer, None);
//! let settings = Settings::resolve(&config, ProjectContext::new("app", "/work/app")).unwrap();
//!
//! assert_eq!(settings.git.abbrev_length, 7);
//! assert_eq!(settings.format.prefix_dot(), "");
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::{
    Config, ConfigError, ConfigLayer, DescribeOptions, FilterOptions, FormatOptions, GitOptions,
    OutputFormat, OutputOptions,
};
use super::filter::PropertyFilter;
use super::paths::StampPaths;

/// Default values for every option.
pub mod defaults {
    /// Abbreviated commit id length.
    pub const ABBREV_LENGTH: u8 = 7;
    /// Longest meaningful abbreviation (a full SHA-1).
    pub const MAX_ABBREV_LENGTH: i64 = 40;
    /// Native git timeout in milliseconds.
    pub const NATIVE_GIT_TIMEOUT_MS: u64 = 30_000;
    /// Commit reference to describe.
    pub const EVALUATE_ON_COMMIT: &str = "HEAD";
    /// Property key namespace.
    pub const PROPERTY_PREFIX: &str = "git";
    /// Date format handed to the extractor.
    pub const DATE_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ssZ";
    /// Time zone used when `$TZ` is not set.
    pub const TIME_ZONE: &str = "UTC";
    /// Describe suffix for a dirty tree.
    pub const DESCRIBE_DIRTY: &str = "-dirty";
    /// Describe tag match pattern.
    pub const DESCRIBE_MATCH: &str = "*";
    /// Properties file encoding.
    pub const SOURCE_CHARSET: &str = "UTF-8";
}

/// Environment variable carrying a reproducible build timestamp.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Build-tool context of the project being stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    /// Project name
    pub name: String,
    /// Project base directory
    pub base_dir: PathBuf,
    /// Project version, if the host knows one
    pub version: Option<String>,
    /// Environment captured for the extractor
    #[serde(skip)]
    pub env: BTreeMap<String, String>,
}

impl ProjectContext {
    /// Create a context with an empty environment.
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            version: None,
            env: BTreeMap::new(),
        }
    }

    /// Create a context named after the last component of `base_dir`.
    pub fn from_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let name = base_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, base_dir)
    }

    /// Set the project version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replace the captured environment.
    pub fn with_env(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = env.into_iter().collect();
        self
    }

    /// Capture the current process environment.
    pub fn capture_env(self) -> Self {
        self.with_env(std::env::vars())
    }

    /// Look up a captured environment variable.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}

/// Fully resolved settings for one build.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Forward extractor log output
    pub verbose: bool,
    /// Skip the generation task
    pub skip: bool,
    /// Reproducible build timestamp from `SOURCE_DATE_EPOCH`
    pub build_timestamp: Option<DateTime<Utc>>,
    /// Repository and extraction settings
    pub git: GitSettings,
    /// Property naming and date formatting
    pub format: FormatSettings,
    /// Include/exclude rules
    pub filter: FilterSettings,
    /// Output file settings
    pub output: OutputSettings,
    /// Project context
    pub project: ProjectContext,
}

/// Resolved `[git]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSettings {
    pub dot_git_directory: PathBuf,
    pub evaluate_on_commit: String,
    pub abbrev_length: u8,
    pub fail_on_no_git_directory: bool,
    pub fail_on_unable_to_extract_repo_info: bool,
    pub use_native_git: bool,
    pub native_git_timeout_ms: u64,
    pub offline: bool,
    pub use_branch_name_from_build_environment: bool,
    pub describe: DescribeConfig,
}

impl GitSettings {
    /// Native git timeout as a duration.
    pub fn native_git_timeout(&self) -> Duration {
        Duration::from_millis(self.native_git_timeout_ms)
    }
}

/// `git describe` configuration handed to the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeConfig {
    pub skip: bool,
    pub always: bool,
    pub abbrev: u8,
    pub dirty: String,
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub tags: bool,
    pub force_long_format: bool,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            skip: false,
            always: true,
            abbrev: defaults::ABBREV_LENGTH,
            dirty: defaults::DESCRIBE_DIRTY.to_string(),
            match_pattern: defaults::DESCRIBE_MATCH.to_string(),
            tags: false,
            force_long_format: false,
        }
    }
}

/// Resolved `[format]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSettings {
    /// Trimmed property prefix (may be empty)
    pub property_prefix: String,
    pub date_format: String,
    pub date_format_time_zone: String,
}

impl FormatSettings {
    /// The prefix with its namespace separator, or `""` for no prefix.
    pub fn prefix_dot(&self) -> String {
        if self.property_prefix.is_empty() {
            String::new()
        } else {
            format!("{}.", self.property_prefix)
        }
    }
}

/// Resolved `[filter]` settings.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSettings {
    pub include_only_properties: Vec<String>,
    pub exclude_properties: Vec<String>,
    #[serde(skip)]
    compiled: PropertyFilter,
}

impl FilterSettings {
    /// The compiled rules.
    pub fn filter(&self) -> &PropertyFilter {
        &self.compiled
    }
}

/// Resolved `[output]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSettings {
    pub generate_output_file: bool,
    pub output_file: PathBuf,
    pub output_format: OutputFormat,
    pub escape_unicode: bool,
    pub source_charset: String,
}

impl Settings {
    /// Resolve a snapshot from layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any invalid value. Nothing is extracted
    /// before this succeeds.
    pub fn resolve(config: &Config, project: ProjectContext) -> Result<Self, ConfigError> {
        Self::from_layer(config.merged(), project)
    }

    /// Resolve a snapshot from a single, already merged layer.
    pub fn from_layer(layer: ConfigLayer, project: ProjectContext) -> Result<Self, ConfigError> {
        let paths = StampPaths::new(&project.base_dir);

        let git = resolve_git(layer.git, &paths)?;
        let format = resolve_format(layer.format, &project);
        let filter = resolve_filter(layer.filter)?;
        let output = resolve_output(layer.output, &paths);
        let build_timestamp = resolve_build_timestamp(&project)?;

        Ok(Self {
            verbose: layer.verbose.unwrap_or(false),
            skip: layer.skip.unwrap_or(false),
            build_timestamp,
            git,
            format,
            filter,
            output,
            project,
        })
    }

    /// Path routing for this project.
    pub fn paths(&self) -> StampPaths {
        StampPaths::new(&self.project.base_dir)
    }

    /// Render the snapshot as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}

fn resolve_git(opts: GitOptions, paths: &StampPaths) -> Result<GitSettings, ConfigError> {
    let abbrev_length = opts
        .abbrev_length
        .map(|n| abbrev_in_range("git.abbrev_length", n, 1))
        .transpose()?
        .unwrap_or(defaults::ABBREV_LENGTH);

    let native_git_timeout_ms = match opts.native_git_timeout_ms {
        None => defaults::NATIVE_GIT_TIMEOUT_MS,
        Some(ms) if ms > 0 => ms as u64,
        Some(ms) => {
            return Err(ConfigError::InvalidValue(format!(
                "git.native_git_timeout_ms must be a positive number of milliseconds, got {}",
                ms
            )))
        }
    };

    let evaluate_on_commit = opts
        .evaluate_on_commit
        .map(|r| r.trim().to_string())
        .unwrap_or_else(|| defaults::EVALUATE_ON_COMMIT.to_string());
    if evaluate_on_commit.is_empty() {
        return Err(ConfigError::InvalidValue(
            "git.evaluate_on_commit cannot be empty".to_string(),
        ));
    }

    let dot_git_directory = match opts.dot_git_directory {
        Some(dir) => paths.resolve(dir),
        None => paths.default_dot_git_directory(),
    };

    Ok(GitSettings {
        dot_git_directory,
        evaluate_on_commit,
        abbrev_length,
        fail_on_no_git_directory: opts.fail_on_no_git_directory.unwrap_or(true),
        fail_on_unable_to_extract_repo_info: opts
            .fail_on_unable_to_extract_repo_info
            .unwrap_or(true),
        use_native_git: opts.use_native_git.unwrap_or(false),
        native_git_timeout_ms,
        offline: opts.offline.unwrap_or(true),
        use_branch_name_from_build_environment: opts
            .use_branch_name_from_build_environment
            .unwrap_or(true),
        describe: resolve_describe(opts.describe)?,
    })
}

fn resolve_describe(opts: DescribeOptions) -> Result<DescribeConfig, ConfigError> {
    let base = DescribeConfig::default();
    let abbrev = match opts.abbrev {
        None => base.abbrev,
        Some(0) => 0,
        Some(n) => abbrev_in_range("git.describe.abbrev", n, 2)?,
    };

    Ok(DescribeConfig {
        skip: opts.skip.unwrap_or(base.skip),
        always: opts.always.unwrap_or(base.always),
        abbrev,
        dirty: opts.dirty.unwrap_or(base.dirty),
        match_pattern: opts.match_pattern.unwrap_or(base.match_pattern),
        tags: opts.tags.unwrap_or(base.tags),
        force_long_format: opts.force_long_format.unwrap_or(base.force_long_format),
    })
}

fn abbrev_in_range(name: &str, value: i64, min: i64) -> Result<u8, ConfigError> {
    if (min..=defaults::MAX_ABBREV_LENGTH).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be between {} and {}, got {}",
            name,
            min,
            defaults::MAX_ABBREV_LENGTH,
            value
        )))
    }
}

fn resolve_format(opts: FormatOptions, project: &ProjectContext) -> FormatSettings {
    let property_prefix = opts
        .property_prefix
        .unwrap_or_else(|| defaults::PROPERTY_PREFIX.to_string())
        .trim()
        .to_string();

    let date_format_time_zone = opts.date_format_time_zone.unwrap_or_else(|| {
        project
            .env_var("TZ")
            .filter(|tz| !tz.is_empty())
            .unwrap_or(defaults::TIME_ZONE)
            .to_string()
    });

    FormatSettings {
        property_prefix,
        date_format: opts
            .date_format
            .unwrap_or_else(|| defaults::DATE_FORMAT.to_string()),
        date_format_time_zone,
    }
}

fn resolve_filter(opts: FilterOptions) -> Result<FilterSettings, ConfigError> {
    let include_only_properties = opts.include_only_properties.unwrap_or_default();
    let exclude_properties = opts.exclude_properties.unwrap_or_default();
    let compiled = PropertyFilter::new(&include_only_properties, &exclude_properties)?;

    Ok(FilterSettings {
        include_only_properties,
        exclude_properties,
        compiled,
    })
}

fn resolve_output(opts: OutputOptions, paths: &StampPaths) -> OutputSettings {
    OutputSettings {
        generate_output_file: opts.generate_output_file.unwrap_or(false),
        output_file: opts
            .output_file
            .map(|p| paths.resolve(p))
            .unwrap_or_else(|| paths.default_output_file()),
        output_format: opts.output_format.unwrap_or_default(),
        escape_unicode: opts.escape_unicode.unwrap_or(true),
        source_charset: opts
            .source_charset
            .unwrap_or_else(|| defaults::SOURCE_CHARSET.to_string()),
    }
}

fn resolve_build_timestamp(project: &ProjectContext) -> Result<Option<DateTime<Utc>>, ConfigError> {
    let Some(raw) = project.env_var(SOURCE_DATE_EPOCH) else {
        return Ok(None);
    };

    let invalid = || {
        ConfigError::InvalidValue(format!(
            "{} must be a unix timestamp in seconds, got '{}'",
            SOURCE_DATE_EPOCH, raw
        ))
    };
    let secs: i64 = raw.trim().parse().map_err(|_| invalid())?;
    DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectContext {
        ProjectContext::new("app", "/work/app")
    }

    fn layer(toml_text: &str) -> ConfigLayer {
        toml::from_str(toml_text).unwrap()
    }

    fn resolve(toml_text: &str) -> Result<Settings, ConfigError> {
        Settings::from_layer(layer(toml_text), project())
    }

    mod defaults_applied {
        use super::*;

        #[test]
        fn every_option_has_a_default() {
            let s = resolve("").unwrap();
            assert!(!s.verbose);
            assert!(!s.skip);
            assert_eq!(s.git.abbrev_length, 7);
            assert_eq!(s.git.evaluate_on_commit, "HEAD");
            assert!(s.git.fail_on_no_git_directory);
            assert!(s.git.fail_on_unable_to_extract_repo_info);
            assert!(!s.git.use_native_git);
            assert_eq!(s.git.native_git_timeout(), Duration::from_millis(30_000));
            assert!(s.git.offline);
            assert!(s.git.use_branch_name_from_build_environment);
            assert_eq!(s.git.describe, DescribeConfig::default());
            assert_eq!(s.format.property_prefix, "git");
            assert_eq!(s.format.date_format, "yyyy-MM-dd'T'HH:mm:ssZ");
            assert_eq!(s.format.date_format_time_zone, "UTC");
            assert!(s.filter.include_only_properties.is_empty());
            assert!(s.filter.exclude_properties.is_empty());
            assert!(!s.output.generate_output_file);
            assert_eq!(
                s.output.output_file,
                PathBuf::from("/work/app/target/git.properties")
            );
            assert_eq!(s.output.output_format, OutputFormat::Properties);
            assert_eq!(s.output.source_charset, "UTF-8");
            assert!(s.build_timestamp.is_none());
        }

        #[test]
        fn dot_git_defaults_to_base_dir() {
            let s = resolve("").unwrap();
            assert_eq!(s.git.dot_git_directory, PathBuf::from("/work/app/.git"));
        }

        #[test]
        fn enclosing_repository_is_not_used() {
            let outer = tempfile::TempDir::new().unwrap();
            std::fs::create_dir(outer.path().join(".git")).unwrap();
            std::fs::write(outer.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
            let base = outer.path().join("sub/project");
            std::fs::create_dir_all(&base).unwrap();

            let s = Settings::from_layer(ConfigLayer::default(), ProjectContext::new("app", &base))
                .unwrap();
            assert_eq!(s.git.dot_git_directory, base.join(".git"));
        }

        #[test]
        fn relative_paths_resolve_against_base_dir() {
            let s = resolve(
                "[git]\ndot_git_directory = \"../.git\"\n[output]\noutput_file = \"out/git.json\"",
            )
            .unwrap();
            assert_eq!(s.git.dot_git_directory, PathBuf::from("/work/app/../.git"));
            assert_eq!(s.output.output_file, PathBuf::from("/work/app/out/git.json"));
        }

        #[test]
        fn time_zone_from_environment() {
            let ctx = project().with_env([("TZ".to_string(), "Europe/Berlin".to_string())]);
            let s = Settings::from_layer(layer(""), ctx).unwrap();
            assert_eq!(s.format.date_format_time_zone, "Europe/Berlin");
        }
    }

    mod abbrev_length {
        use super::*;

        #[test]
        fn zero_rejected() {
            let err = resolve("[git]\nabbrev_length = 0").unwrap_err();
            assert!(err.to_string().contains("git.abbrev_length"));
        }

        #[test]
        fn negative_rejected() {
            assert!(resolve("[git]\nabbrev_length = -3").is_err());
        }

        #[test]
        fn above_sha_length_rejected() {
            assert!(resolve("[git]\nabbrev_length = 41").is_err());
        }

        #[test]
        fn bounds_accepted() {
            assert_eq!(resolve("[git]\nabbrev_length = 1").unwrap().git.abbrev_length, 1);
            assert_eq!(resolve("[git]\nabbrev_length = 40").unwrap().git.abbrev_length, 40);
        }

        #[test]
        fn describe_abbrev_allows_zero_but_not_one() {
            assert_eq!(
                resolve("[git.describe]\nabbrev = 0").unwrap().git.describe.abbrev,
                0
            );
            assert!(resolve("[git.describe]\nabbrev = 1").is_err());
        }
    }

    mod timeout {
        use super::*;

        #[test]
        fn zero_rejected() {
            let err = resolve("[git]\nnative_git_timeout_ms = 0").unwrap_err();
            assert!(err.to_string().contains("native_git_timeout_ms"));
        }

        #[test]
        fn negative_rejected() {
            assert!(resolve("[git]\nnative_git_timeout_ms = -1").is_err());
        }

        #[test]
        fn custom_value() {
            let s = resolve("[git]\nnative_git_timeout_ms = 500").unwrap();
            assert_eq!(s.git.native_git_timeout(), Duration::from_millis(500));
        }
    }

    mod prefix {
        use super::*;

        #[test]
        fn default_has_separator() {
            assert_eq!(resolve("").unwrap().format.prefix_dot(), "git.");
        }

        #[test]
        fn trimmed() {
            let s = resolve("[format]\nproperty_prefix = \"  build  \"").unwrap();
            assert_eq!(s.format.property_prefix, "build");
            assert_eq!(s.format.prefix_dot(), "build.");
        }

        #[test]
        fn blank_prefix_has_no_dangling_dot() {
            let s = resolve("[format]\nproperty_prefix = \"   \"").unwrap();
            assert_eq!(s.format.property_prefix, "");
            assert_eq!(s.format.prefix_dot(), "");
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn malformed_rule_rejected() {
            let err = resolve("[filter]\nexclude_properties = [\"git.(\"]").unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRule(_)));
        }

        #[test]
        fn rules_are_compiled() {
            let s = resolve("[filter]\ninclude_only_properties = [\"^git\\\\.commit\"]").unwrap();
            assert!(s.filter.filter().keeps("git.commit.id"));
            assert!(!s.filter.filter().keeps("git.branch"));
        }

        #[test]
        fn empty_reference_rejected() {
            assert!(resolve("[git]\nevaluate_on_commit = \" \"").is_err());
        }

        #[test]
        fn source_date_epoch() {
            let ctx = project().with_env([(SOURCE_DATE_EPOCH.to_string(), "1704067200".to_string())]);
            let s = Settings::from_layer(layer(""), ctx).unwrap();
            assert_eq!(
                s.build_timestamp.unwrap().to_rfc3339(),
                "2024-01-01T00:00:00+00:00"
            );
        }

        #[test]
        fn malformed_source_date_epoch_rejected() {
            let ctx = project().with_env([(SOURCE_DATE_EPOCH.to_string(), "yesterday".to_string())]);
            let err = Settings::from_layer(layer(""), ctx).unwrap_err();
            assert!(err.to_string().contains(SOURCE_DATE_EPOCH));
        }
    }

    #[test]
    fn renders_as_toml() {
        let text = resolve("[git.describe]\ntags = true").unwrap().to_toml().unwrap();
        assert!(text.contains("abbrev_length = 7"));
        assert!(text.contains("match = \"*\""));
        assert!(text.contains("tags = true"));
    }

    #[test]
    fn project_name_from_base_dir() {
        let ctx = ProjectContext::from_base_dir("/work/my-app");
        assert_eq!(ctx.name, "my-app");
    }
}
