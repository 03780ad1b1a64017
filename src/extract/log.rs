//! extract::log
//!
//! Extractor log sink backed by `tracing`.
//!
//! Extractors tend to be chatty. Their output is forwarded only when the
//! `verbose` option is set; otherwise every message is dropped, errors
//! included, because fatal conditions reach the caller as
//! [`ExtractError`](super::ExtractError) anyway.

use super::traits::ExtractorLog;

/// Forwards extractor messages to `tracing` when verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingLog {
    verbose: bool,
}

impl TracingLog {
    /// Create a sink; `verbose = false` silences it.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ExtractorLog for TracingLog {
    fn debug(&self, message: &str) {
        if self.verbose {
            tracing::debug!(target: "gitstamp::extractor", "{}", message);
        }
    }

    fn info(&self, message: &str) {
        if self.verbose {
            tracing::info!(target: "gitstamp::extractor", "{}", message);
        }
    }

    fn warn(&self, message: &str) {
        if self.verbose {
            tracing::warn!(target: "gitstamp::extractor", "{}", message);
        }
    }

    fn error(&self, message: &str) {
        if self.verbose {
            tracing::error!(target: "gitstamp::extractor", "{}", message);
        }
    }
}
