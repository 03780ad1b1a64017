//! extract
//!
//! Obtaining raw git properties from an extractor.
//!
//! # Architecture
//!
//! - [`traits`]: the [`Extractor`] and [`ExtractionCallback`] contract
//! - [`adapter`]: settings-backed callback and failure policy
//! - [`command`]: external extractor over JSON stdio
//! - [`mock`]: in-memory extractor for tests
//! - [`log`]: `tracing`-backed extractor log sink
//!
//! gitstamp does not read git objects itself. Whatever produces the
//! properties lives behind [`Extractor`].

pub mod adapter;
pub mod command;
pub mod log;
pub mod mock;
pub mod traits;

pub use adapter::{extract, ExtractionFailure, SettingsCallback};
pub use command::CommandExtractor;
pub use log::TracingLog;
pub use mock::MockExtractor;
pub use traits::{ExtractError, ExtractionCallback, ExtractionRequest, Extractor, ExtractorLog};
