//! settings command - Print the resolved settings

use anyhow::Result;

use super::resolve_settings;
use crate::cli::Context;

/// Print the resolved snapshot as TOML.
///
/// No extractor runs.
pub fn settings(ctx: &Context) -> Result<()> {
    let settings = resolve_settings(ctx)?;
    print!("{}", settings.to_toml()?);
    Ok(())
}
