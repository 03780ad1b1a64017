//! core::paths
//!
//! Centralized path routing for gitstamp files.
//!
//! All locations gitstamp reads or writes are derived from the project
//! base directory here, so relative configuration values resolve the
//! same way everywhere.
//!
//! # Layout
//!
//! - `gitstamp.toml` - Project configuration
//! - `target/git.properties` - Default properties file
//! - `target/gitstamp/task-state.json` - Up-to-date record of the last run
//!
//! # Example
//!
//! ```
//! use gitstamp::core::paths::StampPaths;
//! use std::path::PathBuf;
//!
//! let paths = StampPaths::new("/work/app");
//!
//! assert_eq!(paths.project_config_path(), PathBuf::from("/work/app/gitstamp.toml"));
//! assert_eq!(paths.resolve("out/git.json"), PathBuf::from("/work/app/out/git.json"));
//! assert_eq!(paths.resolve("/abs/git.json"), PathBuf::from("/abs/git.json"));
//! ```

use std::path::{Path, PathBuf};

/// Path routing for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampPaths {
    base_dir: PathBuf,
}

impl StampPaths {
    /// Create path routing rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The project base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a configured path against the base directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Canonical project config: `<base>/gitstamp.toml`.
    pub fn project_config_path(&self) -> PathBuf {
        self.base_dir.join("gitstamp.toml")
    }

    /// Compatibility project config: `<base>/.gitstamp.toml`.
    pub fn compat_project_config_path(&self) -> PathBuf {
        self.base_dir.join(".gitstamp.toml")
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    /// Default `.git` directory: `<base>/.git`.
    pub fn default_dot_git_directory(&self) -> PathBuf {
        self.base_dir.join(".git")
    }

    /// Default properties file: `<base>/target/git.properties`.
    pub fn default_output_file(&self) -> PathBuf {
        self.base_dir.join("target").join("git.properties")
    }

    // =========================================================================
    // Task state
    // =========================================================================

    /// Directory holding gitstamp's own bookkeeping.
    pub fn state_dir(&self) -> PathBuf {
        self.base_dir.join("target").join("gitstamp")
    }

    /// Up-to-date record of the last generation run.
    pub fn task_state_path(&self) -> PathBuf {
        self.state_dir().join("task-state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_lives_under_target() {
        let paths = StampPaths::new("/p");
        assert_eq!(
            paths.task_state_path(),
            PathBuf::from("/p/target/gitstamp/task-state.json")
        );
        assert!(paths.task_state_path().starts_with(paths.state_dir()));
    }

    #[test]
    fn defaults() {
        let paths = StampPaths::new("/p");
        assert_eq!(paths.default_dot_git_directory(), PathBuf::from("/p/.git"));
        assert_eq!(
            paths.default_output_file(),
            PathBuf::from("/p/target/git.properties")
        );
        assert_eq!(
            paths.compat_project_config_path(),
            PathBuf::from("/p/.gitstamp.toml")
        );
    }
}
