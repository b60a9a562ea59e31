//! Mock content source for testing.
//!
//! Provides [`MockSource`] for unit testing without filesystem or network
//! access.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::source::{ContentSource, ErrorStatus, SourceError, SourceErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Normalize a location so `/a.md` and `a.md` address the same entry.
fn key(location: &str) -> String {
    location.trim_start_matches('/').to_owned()
}

/// Mock content source for testing.
///
/// Stores texts in memory and counts reads per location. Failures and
/// artificial delays can be configured per location.
///
/// # Example
///
/// ```ignore
/// use asdm_source::{ContentSource, MockSource};
///
/// let source = MockSource::new().with_text("/docs/intro.md", "# Intro");
///
/// assert_eq!(source.read("/docs/intro.md").unwrap(), "# Intro");
/// assert_eq!(source.read_count("/docs/intro.md"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    texts: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, (SourceErrorKind, ErrorStatus)>>,
    delays: RwLock<HashMap<String, Duration>>,
    reads: RwLock<HashMap<String, usize>>,
}

impl MockSource {
    /// Create a new empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text for a location.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_text(self, location: &str, text: impl Into<String>) -> Self {
        self.set_text(location, text);
        self
    }

    /// Make reads of a location fail with the given kind.
    ///
    /// 5xx-like kinds (`Unavailable`, `RateLimited`, `Timeout`) are retryable.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, location: &str, kind: SourceErrorKind) -> Self {
        let status = match kind {
            SourceErrorKind::Unavailable | SourceErrorKind::RateLimited => ErrorStatus::Persistent,
            SourceErrorKind::Timeout => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        self.failures
            .write()
            .unwrap()
            .insert(key(location), (kind, status));
        self
    }

    /// Delay reads of a location (the calling thread sleeps).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_delay(self, location: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(key(location), delay);
        self
    }

    /// Replace the text stored at a location.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_text(&self, location: &str, text: impl Into<String>) {
        self.texts.write().unwrap().insert(key(location), text.into());
    }

    /// Number of reads issued for a location, successful or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn read_count(&self, location: &str) -> usize {
        self.reads
            .read()
            .unwrap()
            .get(&key(location))
            .copied()
            .unwrap_or(0)
    }

    /// Number of reads issued across all locations.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.reads.read().unwrap().values().sum()
    }
}

impl ContentSource for MockSource {
    fn read(&self, location: &str) -> Result<String, SourceError> {
        let k = key(location);
        *self.reads.write().unwrap().entry(k.clone()).or_insert(0) += 1;

        let delay = self.delays.read().unwrap().get(&k).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if let Some((kind, status)) = self.failures.read().unwrap().get(&k).copied() {
            return Err(SourceError::new(kind)
                .with_status(status)
                .with_backend(BACKEND)
                .with_location(location));
        }

        self.texts
            .read()
            .unwrap()
            .get(&k)
            .cloned()
            .ok_or_else(|| SourceError::not_found(location).with_backend(BACKEND))
    }

    fn describe(&self) -> String {
        "mock".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_counts_per_location() {
        let source = MockSource::new()
            .with_text("/a.md", "a")
            .with_text("b.md", "b");

        source.read("a.md").unwrap();
        source.read("/a.md").unwrap();
        source.read("/b.md").unwrap();

        assert_eq!(source.read_count("/a.md"), 2);
        assert_eq!(source.read_count("b.md"), 1);
        assert_eq!(source.total_reads(), 3);
    }

    #[test]
    fn test_missing_location_is_not_found() {
        let source = MockSource::new();

        let err = source.read("/missing.md").unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::NotFound);
        assert_eq!(err.backend, Some("Mock"));
        assert_eq!(source.read_count("/missing.md"), 1);
    }

    #[test]
    fn test_failure_overrides_text() {
        let source = MockSource::new()
            .with_text("/a.md", "a")
            .with_failure("/a.md", SourceErrorKind::Unavailable);

        let err = source.read("/a.md").unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::Unavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_set_text_replaces_content() {
        let source = MockSource::new().with_text("/a.md", "old");

        source.set_text("/a.md", "new");

        assert_eq!(source.read("/a.md").unwrap(), "new");
    }
}
