//! engine
//!
//! Runs one build: resolve settings, publish properties, decide whether
//! the generation task has anything to do.
//!
//! # Lifecycle
//!
//! ```text
//! BuildContext::new -> GenerationTask::run -> [GitProperties reads] -> teardown
//! ```
//!
//! - [`context`]: build-scoped settings and publisher
//! - [`publisher`]: memoized extract/filter/stabilize pipeline
//! - [`task`]: the generation task and its up-to-date check
//! - [`state`]: persisted fingerprint of the last executed run
//!
//! # Invariants
//!
//! - The extractor runs at most once per build context
//! - Configuration errors surface before any extraction
//! - A skipped task never extracts

pub mod context;
pub mod publisher;
pub mod state;
pub mod task;

pub use context::BuildContext;
pub use publisher::{GitProperties, PublishError, ResultPublisher};
pub use state::{StateError, TaskState};
pub use task::{GenerationTask, TaskError, TaskFiles, TaskOutcome};
