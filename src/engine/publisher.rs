//! engine::publisher
//!
//! Computed-once publication of the processed property map.
//!
//! # Lifecycle
//!
//! The first [`ResultPublisher::get_result`] call runs the pipeline:
//!
//! ```text
//! extract -> filter -> stabilize -> cache
//! ```
//!
//! Every later call returns the cached map without touching the
//! extractor, until [`ResultPublisher::reset`] is called at the end of the
//! build. The lock is held while computing, so a concurrent caller waits
//! for the first result instead of extracting again.
//!
//! A failed computation caches nothing; the next call tries again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gitstamp::core::config::ConfigLayer;
//! use gitstamp::core::settings::{ProjectContext, Settings};
//! use gitstamp::engine::publisher::ResultPublisher;
//! use gitstamp::extract::MockExtractor;
//!
//! let mut layer = ConfigLayer::default();
//! layer.git.dot_git_directory = Some(".git".into());
//! let settings = Settings::from_layer(layer, ProjectContext::new("app", "/work/app")).unwrap();
//!
//! let mock = MockExtractor::new([("git.build.time", "12:00")].into_iter().collect());
//! let publisher = ResultPublisher::new(Arc::new(settings), Box::new(mock.clone()));
//!
//! let first = publisher.get_result().unwrap();
//! let second = publisher.get_result().unwrap();
//! assert_eq!(first.get("git.build.time"), Some(""));
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(mock.call_count(), 1);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::core::settings::Settings;
use crate::core::stabilize::stabilize;
use crate::core::types::PropertyMap;
use crate::extract::{self, ExtractionFailure, Extractor};

/// Errors from publishing the result.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Extraction failed fatally.
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}

/// Owns the extractor and the memoized result for one build.
pub struct ResultPublisher {
    settings: Arc<Settings>,
    extractor: Box<dyn Extractor>,
    cache: Mutex<Option<Arc<PropertyMap>>>,
}

impl std::fmt::Debug for ResultPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPublisher")
            .field("computed", &self.is_computed())
            .finish_non_exhaustive()
    }
}

impl ResultPublisher {
    /// Create a publisher; nothing runs until the first request.
    pub fn new(settings: Arc<Settings>, extractor: Box<dyn Extractor>) -> Self {
        Self {
            settings,
            extractor,
            cache: Mutex::new(None),
        }
    }

    /// The snapshot results are computed from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The processed property map, computing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when extraction fails fatally. Nothing is
    /// cached in that case.
    pub fn get_result(&self) -> Result<Arc<PropertyMap>, PublishError> {
        let mut cache = self.lock();
        if let Some(result) = cache.as_ref() {
            return Ok(Arc::clone(result));
        }

        let result = Arc::new(self.compute()?);
        *cache = Some(Arc::clone(&result));
        Ok(result)
    }

    /// Whether a result is currently memoized.
    pub fn is_computed(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the memoized result.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    fn compute(&self) -> Result<PropertyMap, PublishError> {
        let settings = &*self.settings;
        let raw = extract::extract(self.extractor.as_ref(), settings)?;
        let raw_count = raw.len();

        let filtered = settings.filter.filter().apply(raw);
        let result = stabilize(filtered, &settings.format.property_prefix);

        tracing::debug!(
            extracted = raw_count,
            published = result.len(),
            "Published git properties"
        );
        Ok(result)
    }

    // Poisoning only happens if a panic escaped mid-computation, and in
    // that case the cache was never filled.
    fn lock(&self) -> MutexGuard<'_, Option<Arc<PropertyMap>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read-through, dynamically keyed view of the published result.
///
/// Reading any key computes the result if needed.
#[derive(Debug, Clone, Copy)]
pub struct GitProperties<'a> {
    publisher: &'a ResultPublisher,
}

impl<'a> GitProperties<'a> {
    /// View over `publisher`.
    pub fn new(publisher: &'a ResultPublisher) -> Self {
        Self { publisher }
    }

    /// Value of `key`, or `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, PublishError> {
        Ok(self.publisher.get_result()?.get(key).map(str::to_string))
    }

    /// Value of `key`, or `default` when unset.
    pub fn get_or(&self, key: &str, default: &str) -> Result<String, PublishError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Whether `key` is set.
    pub fn contains(&self, key: &str) -> Result<bool, PublishError> {
        Ok(self.publisher.get_result()?.contains_key(key))
    }

    /// Every key, in order.
    pub fn keys(&self) -> Result<Vec<String>, PublishError> {
        Ok(self.publisher.get_result()?.keys().map(str::to_string).collect())
    }

    /// A copy of the whole map.
    pub fn to_map(&self) -> Result<PropertyMap, PublishError> {
        Ok(self.publisher.get_result()?.as_ref().clone())
    }
}
