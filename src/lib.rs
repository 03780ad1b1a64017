//! gitstamp - stamp builds with filtered, cache-stable git properties
//!
//! gitstamp sits between a build and whatever extracts git metadata. It
//! resolves a settings snapshot, hands it to an extractor, filters and
//! stabilizes the returned properties, and publishes the result once per
//! build for the build's tasks to consume.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (parses args, delegates to engine)
//! - [`engine`] - Build context, memoized publisher, generation task
//! - [`extract`] - Extractor contract, adapter, and bundled extractors
//! - [`core`] - Configuration, settings, filter, stabilization, types
//! - [`git`] - Repository discovery
//!
//! # Invariants
//!
//! 1. Settings are validated once, before anything is extracted
//! 2. The extractor runs at most once per build
//! 3. Exclude rules always win over include rules
//! 4. Build timestamps never change the published fingerprint

pub mod cli;
pub mod core;
pub mod engine;
pub mod extract;
pub mod git;
