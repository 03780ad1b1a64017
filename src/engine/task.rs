//! engine::task
//!
//! The generation task and its up-to-date check.
//!
//! # Outcomes
//!
//! | Condition                                          | Outcome    |
//! |----------------------------------------------------|------------|
//! | `skip = true`                                      | `Skipped`  |
//! | fingerprint unchanged and output file present      | `UpToDate` |
//! | anything else                                      | `Executed` |
//!
//! A skipped task never calls the extractor. Otherwise the published
//! result is computed (or taken from the build's cache) and fingerprinted
//! together with the declared input and output, and the fingerprint is
//! compared with the one persisted by the last executed run.
//!
//! The output file is written by the extractor, never by the task. The
//! task only declares it and checks that it exists.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::core::types::{Fingerprint, PropertyMap};

use super::context::BuildContext;
use super::publisher::PublishError;
use super::state::{StateError, TaskState};

/// Errors from running the generation task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Result of one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Disabled by configuration; nothing was extracted.
    Skipped,
    /// Nothing changed since the last executed run.
    UpToDate {
        properties: Arc<PropertyMap>,
        fingerprint: Fingerprint,
    },
    /// The task ran and its state was recorded.
    Executed {
        properties: Arc<PropertyMap>,
        fingerprint: Fingerprint,
    },
}

impl TaskOutcome {
    /// Published properties, unless skipped.
    pub fn properties(&self) -> Option<&PropertyMap> {
        match self {
            TaskOutcome::Skipped => None,
            TaskOutcome::UpToDate { properties, .. } | TaskOutcome::Executed { properties, .. } => {
                Some(properties)
            }
        }
    }

    /// Short label for reporting.
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Skipped => "skipped",
            TaskOutcome::UpToDate { .. } => "up-to-date",
            TaskOutcome::Executed { .. } => "executed",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Staleness inputs and outputs of the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFiles {
    /// The dot-git directory the properties come from
    pub input_dir: PathBuf,
    /// The output file, when generation is enabled
    pub output_file: Option<PathBuf>,
}

/// Produces the git properties for a build.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenerationTask;

impl GenerationTask {
    pub fn new() -> Self {
        Self
    }

    /// Declared input directory.
    pub fn inputs(&self, ctx: &BuildContext) -> PathBuf {
        ctx.settings().git.dot_git_directory.clone()
    }

    /// Declared output file, if generation is enabled.
    pub fn outputs(&self, ctx: &BuildContext) -> Option<PathBuf> {
        let output = &ctx.settings().output;
        output.generate_output_file.then(|| output.output_file.clone())
    }

    /// Inputs and outputs together.
    pub fn files(&self, ctx: &BuildContext) -> TaskFiles {
        TaskFiles {
            input_dir: self.inputs(ctx),
            output_file: self.outputs(ctx),
        }
    }

    /// Fingerprint `props` together with the task's declared files.
    pub fn fingerprint(&self, ctx: &BuildContext, props: &PropertyMap) -> Fingerprint {
        let files = self.files(ctx);
        let input = files.input_dir.to_string_lossy().into_owned();
        let output_file = files
            .output_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = ctx.settings().output.output_format.to_string();

        Fingerprint::compute_with(
            props,
            [
                ("input", input.as_str()),
                ("output", output_file.as_str()),
                ("format", format.as_str()),
            ],
        )
    }

    /// Run the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] when extraction fails fatally or the state
    /// file cannot be written.
    pub fn run(&self, ctx: &BuildContext) -> Result<TaskOutcome, TaskError> {
        let settings = ctx.settings();
        if settings.skip {
            tracing::info!("Skipping git property generation (skip = true)");
            return Ok(TaskOutcome::Skipped);
        }

        let properties = ctx.publisher().get_result()?;
        let fingerprint = self.fingerprint(ctx, &properties);
        let output_file = self.outputs(ctx);
        let paths = settings.paths();

        let previous = TaskState::read(&paths)?;
        let output_present = output_file.as_ref().map_or(true, |p| p.exists());
        let unchanged = previous
            .as_ref()
            .is_some_and(|state| state.fingerprint == fingerprint);

        if unchanged && output_present {
            tracing::info!(fingerprint = %fingerprint, "Git properties are up to date");
            return Ok(TaskOutcome::UpToDate {
                properties,
                fingerprint,
            });
        }

        TaskState::new(fingerprint.clone(), output_file.unwrap_or_default()).write(&paths)?;
        tracing::info!(
            count = properties.len(),
            fingerprint = %fingerprint,
            "Generated git properties"
        );

        Ok(TaskOutcome::Executed {
            properties,
            fingerprint,
        })
    }
}
