//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--cwd <path>`: Run as if in that directory
//! - `--config <file>`: Use this project config file
//! - `--extractor <cmd>`: Extractor command line (or `$GITSTAMP_EXTRACTOR`)
//! - `--discover-git-dir`: Search parent directories for the repository
//! - `--project-version <v>`: Version reported to the extractor
//! - `--verbose` / `-v`: Debug logging and extractor output
//! - `--quiet` / `-q`: Errors only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitstamp - stamp builds with filtered, cache-stable git properties
#[derive(Parser, Debug)]
#[command(name = "gitstamp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitstamp was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Project config file to use instead of <base>/gitstamp.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extractor command line, run with a JSON request on stdin
    #[arg(long, global = true, env = "GITSTAMP_EXTRACTOR", value_name = "CMD")]
    pub extractor: Option<String>,

    /// Kill the extractor after this many milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub extractor_timeout_ms: Option<u64>,

    /// Use the repository enclosing the project instead of <base>/.git
    #[arg(long, global = true)]
    pub discover_git_dir: bool,

    /// Project version handed to the extractor
    #[arg(long, global = true, env = "GITSTAMP_PROJECT_VERSION", value_name = "VERSION")]
    pub project_version: Option<String>,

    /// Debug logging; forwards extractor output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and requested values
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the generation task and print the published properties
    #[command(
        long_about = "Run the generation task.\n\n\
            Resolves settings, runs the extractor (at most once), filters and \
            stabilizes the returned properties, and records a fingerprint so an \
            unchanged repository is reported as up to date. When \
            output.generate_output_file is set the task stays stale until the \
            extractor has written the output file.",
        after_help = "\
EXAMPLES:
    # Properties format on stdout
    gitstamp --extractor ./git-props generate

    # Machine-readable outcome and properties
    gitstamp generate --json"
    )]
    Generate {
        /// Print outcome, fingerprint and properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a single published property
    Get {
        /// Property key, e.g. git.commit.id
        key: String,

        /// Printed when the key is not set
        #[arg(long, value_name = "VALUE")]
        default: Option<String>,
    },

    /// Print the resolved settings as TOML
    Settings,

    /// Write a starter gitstamp.toml
    Init {
        /// Overwrite an existing project config
        #[arg(long)]
        force: bool,
    },
}
