//! generate command - Run the generation task

use anyhow::{Context as _, Result};
use serde_json::json;

use super::build_context;
use crate::cli::Context;
use crate::engine::{GenerationTask, TaskOutcome};

/// Run the generation task and print what it published.
pub fn generate(ctx: &Context, json: bool) -> Result<()> {
    let build = build_context(ctx)?;
    let outcome = GenerationTask::new()
        .run(&build)
        .context("Failed to generate git properties")?;

    if json {
        let (fingerprint, properties) = match &outcome {
            TaskOutcome::Skipped => (None, None),
            TaskOutcome::UpToDate {
                properties,
                fingerprint,
            }
            | TaskOutcome::Executed {
                properties,
                fingerprint,
            } => (Some(fingerprint.as_str()), Some(properties.as_ref())),
        };
        let report = json!({
            "outcome": outcome.label(),
            "fingerprint": fingerprint,
            "properties": properties,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(properties) = outcome.properties() {
            for (key, value) in properties.iter() {
                println!("{}={}", key, value);
            }
        }
        if !ctx.quiet {
            eprintln!("gitstamp: {}", outcome);
        }
    }

    build.teardown();
    Ok(())
}
