//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the project base directory
//! 2. Builds a [`BuildContext`] when it needs properties
//! 3. Formats and displays output
//!
//! Handlers never call the extractor directly; everything goes through
//! the context's publisher.

mod generate;
mod get;
mod init;
mod settings_cmd;

pub use generate::generate;
pub use get::get;
pub use init::init;
pub use settings_cmd::settings;

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;
use crate::core::config::{Config, ConfigLayer};
use crate::core::settings::{ProjectContext, Settings};
use crate::core::types::PropertyMap;
use crate::engine::BuildContext;
use crate::extract::{CommandExtractor, ExtractError, ExtractionCallback, Extractor};
use crate::git;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Generate { json } => generate(ctx, json),
        Command::Get { key, default } => get(ctx, &key, default.as_deref()),
        Command::Settings => settings(ctx),
        Command::Init { force } => init(ctx, force),
    }
}

/// Load the layered configuration for the context's project.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let base_dir = ctx.base_dir()?;
    let result = Config::load(&base_dir).context("Failed to load config")?;
    for warning in &result.warnings {
        tracing::warn!("{} ({})", warning.message, warning.path.display());
    }

    let mut config = result.config;
    if let Some(path) = &ctx.config_file {
        config = config
            .with_project_file(&base_dir.join(path))
            .context("Failed to load config")?;
    }

    let mut overrides = ConfigLayer::default();
    if ctx.verbose {
        overrides.verbose = Some(true);
    }
    if ctx.discover_git_dir {
        match git::discover_git_dir(&base_dir) {
            Ok(dir) => {
                tracing::debug!("Using repository at {}", dir.display());
                overrides.git.dot_git_directory = Some(dir);
            }
            Err(e) => tracing::warn!("{}; using the configured .git directory", e),
        }
    }
    Ok(config.with_overrides(overrides))
}

/// Project context for the current process.
pub(crate) fn project_context(ctx: &Context) -> Result<ProjectContext> {
    let mut project = ProjectContext::from_base_dir(ctx.base_dir()?).capture_env();
    if let Some(version) = &ctx.project_version {
        project = project.with_version(version.clone());
    }
    Ok(project)
}

/// Resolve settings without creating an extractor.
pub(crate) fn resolve_settings(ctx: &Context) -> Result<Settings> {
    let config = load_config(ctx)?;
    Settings::resolve(&config, project_context(ctx)?).context("Invalid configuration")
}

/// Build context with the configured extractor.
pub(crate) fn build_context(ctx: &Context) -> Result<BuildContext> {
    let config = load_config(ctx)?;
    let extractor = extractor(ctx)?;
    BuildContext::new(&config, project_context(ctx)?, extractor).context("Invalid configuration")
}

fn extractor(ctx: &Context) -> Result<Box<dyn Extractor>> {
    let Some(line) = ctx.extractor.as_deref() else {
        return Ok(Box::new(Unconfigured));
    };
    let mut cmd = CommandExtractor::parse(line).context("Invalid extractor command")?;
    if let Some(timeout) = ctx.extractor_timeout {
        cmd = cmd.with_timeout(timeout);
    }
    Ok(Box::new(cmd))
}

/// Stand-in used when no extractor command was given.
///
/// Fails like any other extractor, so the usual failure policy applies
/// and a skipped task still succeeds.
struct Unconfigured;

impl Extractor for Unconfigured {
    fn extract(&self, _callback: &dyn ExtractionCallback) -> Result<PropertyMap, ExtractError> {
        Err(ExtractError::execution(
            "no extractor configured; pass --extractor or set GITSTAMP_EXTRACTOR",
        ))
    }
}
