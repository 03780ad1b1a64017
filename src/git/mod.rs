//! git
//!
//! Repository discovery.
//!
//! # Architecture
//!
//! gitstamp never reads repository contents itself; commit metadata comes
//! from the external extractor. The one thing it can ask of git is the
//! location of the enclosing `.git` directory, used by the CLI's
//! `--discover-git-dir` instead of the `<base>/.git` default. This module
//! is the only place that imports `git2`.
//!
//! # Example
//!
//! ```ignore
//! use gitstamp::git::discover_git_dir;
//! use std::path::Path;
//!
//! // Works from any directory inside the working tree
//! let git_dir = discover_git_dir(Path::new("./src"))?;
//! assert!(git_dir.ends_with(".git"));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from repository discovery.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },
}

/// Find the `.git` directory of the repository containing `start`.
///
/// `start` can be any directory within the working tree. The search stops
/// at the directories listed in `$GIT_CEILING_DIRECTORIES`, as it does for
/// git itself. For linked worktrees this is the worktree-specific
/// directory under `.git/worktrees/`.
///
/// # Errors
///
/// Returns [`GitError::NotARepo`] if no repository encloses `start`.
pub fn discover_git_dir(start: &Path) -> Result<PathBuf, GitError> {
    let ceilings: Vec<PathBuf> = std::env::var_os("GIT_CEILING_DIRECTORIES")
        .map(|dirs| std::env::split_paths(&dirs).collect())
        .unwrap_or_default();
    let repo = git2::Repository::open_ext(start, git2::RepositoryOpenFlags::empty(), &ceilings)
        .map_err(|_| GitError::NotARepo {
            path: start.to_path_buf(),
        })?;

    let git_dir = repo.path();
    // git2 reports directories with a trailing separator.
    Ok(git_dir.components().collect())
}
