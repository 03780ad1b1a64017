//! core::stabilize
//!
//! Blanking of volatile properties so a property map can serve as a
//! cache fingerprint.
//!
//! The build timestamp differs on every invocation. Left in place it
//! would make every run look out of date. Its key is kept with an empty
//! value so consumers that test for the key still find it.

use super::types::{PropertyMap, BUILD_TIME};

/// Blank the values of build-time properties under `prefix`.
///
/// A key is blanked when it starts with `prefix` and ends with
/// [`BUILD_TIME`]. The prefix is matched as written (no separator is
/// added), so an empty prefix blanks build-time keys in every namespace.
/// The key set is never changed.
///
/// # Example
///
/// ```
/// use gitstamp::core::stabilize::stabilize;
/// use gitstamp::core::types::PropertyMap;
///
/// let props: PropertyMap = [
///     ("git.commit.id", "abc123"),
///     ("git.build.time", "2024-01-01T00:00:00Z"),
/// ]
/// .into_iter()
/// .collect();
///
/// let stable = stabilize(props, "git");
/// assert_eq!(stable.get("git.build.time"), Some(""));
/// assert_eq!(stable.get("git.commit.id"), Some("abc123"));
/// ```
pub fn stabilize(props: PropertyMap, prefix: &str) -> PropertyMap {
    props
        .into_iter()
        .map(|(key, value)| {
            if is_volatile(&key, prefix) {
                (key, String::new())
            } else {
                (key, value)
            }
        })
        .collect()
}

/// Whether `key` names a volatile property under `prefix`.
pub fn is_volatile(key: &str, prefix: &str) -> bool {
    key.starts_with(prefix) && key.ends_with(BUILD_TIME)
}
