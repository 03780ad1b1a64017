//! init command - Write a starter project config

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, ConfigLayer};
use crate::core::paths::StampPaths;
use crate::core::settings::defaults;

/// Write `gitstamp.toml` in the base directory.
///
/// The file spells out the most commonly changed options at their
/// defaults. An existing file is left alone unless `force` is set.
pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let base_dir = ctx.base_dir()?;
    let path = StampPaths::new(&base_dir).project_config_path();

    if path.exists() && !force {
        bail!(
            "{} already exists; use --force to overwrite it",
            path.display()
        );
    }

    let mut layer = ConfigLayer::default();
    layer.git.evaluate_on_commit = Some(defaults::EVALUATE_ON_COMMIT.to_string());
    layer.git.abbrev_length = Some(i64::from(defaults::ABBREV_LENGTH));
    layer.git.fail_on_no_git_directory = Some(true);
    layer.format.property_prefix = Some(defaults::PROPERTY_PREFIX.to_string());
    layer.filter.exclude_properties = Some(Vec::new());
    layer.filter.include_only_properties = Some(Vec::new());
    layer.output.generate_output_file = Some(false);

    let written = Config::write_project(&base_dir, &layer).context("Failed to write config")?;

    if !ctx.quiet {
        println!("Wrote {}", written.display());
    }
    Ok(())
}
