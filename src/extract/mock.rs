//! extract::mock
//!
//! In-memory extractor for deterministic testing.
//!
//! # Design
//!
//! [`MockExtractor`] returns a fixed property map (or a fixed error) and
//! records every request it receives. Clones share state, so a test can
//! hand one clone to the engine and inspect the other.
//!
//! # Example
//!
//! ```
//! use gitstamp::extract::mock::MockExtractor;
//! use gitstamp::core::types::PropertyMap;
//!
//! let props: PropertyMap = [("git.commit.id", "abc123")].into_iter().collect();
//! let mock = MockExtractor::new(props);
//! assert_eq!(mock.call_count(), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{ExtractError, ExtractionCallback, ExtractionRequest, Extractor};
use crate::core::types::PropertyMap;

/// Mock extractor for testing.
#[derive(Debug, Clone, Default)]
pub struct MockExtractor {
    inner: Arc<Mutex<MockExtractorInner>>,
}

#[derive(Debug, Default)]
struct MockExtractorInner {
    properties: PropertyMap,
    fail_with: Option<ExtractError>,
    requests: Vec<ExtractionRequest>,
}

impl MockExtractor {
    /// A mock that returns `properties` on every call.
    pub fn new(properties: PropertyMap) -> Self {
        let mock = Self::default();
        mock.lock().properties = properties;
        mock
    }

    /// A mock that fails every call with `error`.
    pub fn failing(error: ExtractError) -> Self {
        let mock = Self::default();
        mock.lock().fail_with = Some(error);
        mock
    }

    /// Replace the properties returned by later calls.
    pub fn set_properties(&self, properties: PropertyMap) {
        self.lock().properties = properties;
    }

    /// Fail later calls with `error`, or succeed again with `None`.
    pub fn fail_with(&self, error: Option<ExtractError>) {
        self.lock().fail_with = error;
    }

    /// Number of times `extract` has been called.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.lock().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<ExtractionRequest> {
        self.lock().requests.last().cloned()
    }

    // A panic inside a test while holding the lock should not cascade.
    fn lock(&self) -> MutexGuard<'_, MockExtractorInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, callback: &dyn ExtractionCallback) -> Result<PropertyMap, ExtractError> {
        let request = ExtractionRequest::from_callback(callback);
        callback.log().debug(&format!(
            "mock extraction of {} at {}",
            request.dot_git_directory.display(),
            request.evaluate_on_commit
        ));

        let mut inner = self.lock();
        inner.requests.push(request);
        match &inner.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(inner.properties.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigLayer;
    use crate::core::settings::{ProjectContext, Settings};
    use crate::extract::adapter::SettingsCallback;

    fn settings() -> Settings {
        let mut layer = ConfigLayer::default();
        layer.git.dot_git_directory = Some(".git".into());
        Settings::from_layer(layer, ProjectContext::new("app", "/work/app")).unwrap()
    }

    #[test]
    fn clones_share_state() {
        let mock = MockExtractor::new([("git.branch", "main")].into_iter().collect());
        let handle = mock.clone();
        let s = settings();

        let props = mock.extract(&SettingsCallback::new(&s)).unwrap();
        assert_eq!(props.get("git.branch"), Some("main"));
        assert_eq!(handle.call_count(), 1);
        assert_eq!(handle.requests()[0].project_name, "app");
    }

    #[test]
    fn failure_can_be_toggled() {
        let mock = MockExtractor::failing(ExtractError::execution("nope"));
        let s = settings();
        let callback = SettingsCallback::new(&s);

        assert!(mock.extract(&callback).is_err());
        mock.fail_with(None);
        assert!(mock.extract(&callback).unwrap().is_empty());
        assert_eq!(mock.call_count(), 2);
    }
}
