//! cli
//!
//! Command-line interface layer for gitstamp.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and pick the extractor
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and hands a
//! [`BuildContext`](crate::engine::BuildContext) to the engine. Library
//! errors are converted to `anyhow` here and nowhere else.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override
    pub cwd: Option<PathBuf>,
    /// Explicit project config file
    pub config_file: Option<PathBuf>,
    /// Extractor command line
    pub extractor: Option<String>,
    /// Extractor kill timeout
    pub extractor_timeout: Option<Duration>,
    /// Search upwards for the `.git` directory
    pub discover_git_dir: bool,
    /// Project version for the extractor
    pub project_version: Option<String>,
    /// Verbose mode
    pub verbose: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Context {
    /// Project base directory.
    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }
}

impl From<&Cli> for Context {
    fn from(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            config_file: cli.config.clone(),
            extractor: cli.extractor.clone(),
            extractor_timeout: cli.extractor_timeout_ms.map(Duration::from_millis),
            discover_git_dir: cli.discover_git_dir,
            project_version: cli.project_version.clone(),
            verbose: cli.verbose,
            quiet: cli.quiet,
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from(&cli);
    commands::dispatch(cli.command, &ctx)
}
