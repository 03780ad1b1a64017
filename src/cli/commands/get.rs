//! get command - Print one published property

use anyhow::{bail, Context as _, Result};

use super::build_context;
use crate::cli::Context;

/// Print the value of `key`.
///
/// Fails when the key is unset and no default was given.
pub fn get(ctx: &Context, key: &str, default: Option<&str>) -> Result<()> {
    let build = build_context(ctx)?;
    let props = build.git_properties();

    let value = match default {
        Some(default) => props.get_or(key, default),
        None => match props.get(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => bail!("Property '{}' is not set", key),
            Err(e) => Err(e),
        },
    }
    .context("Failed to read git properties")?;

    println!("{}", value);
    Ok(())
}
