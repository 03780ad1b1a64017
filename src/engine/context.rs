//! engine::context
//!
//! Build-scoped state.
//!
//! A [`BuildContext`] exists for exactly one build. It resolves the
//! settings snapshot up front, so configuration errors surface before any
//! extraction, and owns the [`ResultPublisher`] whose cache lives as long
//! as the build does.

use std::sync::Arc;

use crate::core::config::{Config, ConfigError};
use crate::core::settings::{ProjectContext, Settings};
use crate::extract::Extractor;

use super::publisher::{GitProperties, ResultPublisher};

/// Everything one build shares.
#[derive(Debug)]
pub struct BuildContext {
    settings: Arc<Settings>,
    publisher: ResultPublisher,
}

impl BuildContext {
    /// Resolve settings and set up the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid. The
    /// extractor is not called.
    pub fn new(
        config: &Config,
        project: ProjectContext,
        extractor: Box<dyn Extractor>,
    ) -> Result<Self, ConfigError> {
        let settings = Settings::resolve(config, project)?;
        Ok(Self::from_settings(settings, extractor))
    }

    /// Build a context around an already resolved snapshot.
    pub fn from_settings(settings: Settings, extractor: Box<dyn Extractor>) -> Self {
        let settings = Arc::new(settings);
        let publisher = ResultPublisher::new(Arc::clone(&settings), extractor);
        Self {
            settings,
            publisher,
        }
    }

    /// The resolved snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The build's publisher.
    pub fn publisher(&self) -> &ResultPublisher {
        &self.publisher
    }

    /// Read-through view of the published properties.
    pub fn git_properties(&self) -> GitProperties<'_> {
        GitProperties::new(&self.publisher)
    }

    /// End of build: drop the memoized result.
    pub fn teardown(&self) {
        self.publisher.reset();
    }
}

impl Drop for BuildContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
