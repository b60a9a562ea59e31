//! Content source trait and error types.
//!
//! Provides the core [`ContentSource`] trait for fetching manifests, documents
//! and translation bundles, along with [`SourceError`] for unified error
//! handling across backends.
//!
//! # Location Convention
//!
//! All locations are slash-separated paths, independent of the backend:
//! - `"/docs/en-us/site-tree.yml"` - a site manifest
//! - `"/docs/en-us/guide/_index.md"` - a document body
//! - `"/locale/zh-cn/Library.json"` - a translation bundle
//!
//! A leading slash is optional. Backends map locations to files or URLs.

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Location is malformed or escapes the source root.
    InvalidLocation,
    /// Backend is temporarily unavailable (connection refused, 5xx).
    Unavailable,
    /// Too many requests.
    RateLimited,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid location).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
    /// Retry with backoff (rate limited, service unavailable).
    Persistent,
}

/// Source error with semantic kind and backend-specific cause.
#[derive(Debug)]
pub struct SourceError {
    /// Semantic error category.
    pub kind: SourceErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Location context (if applicable).
    pub location: Option<String>,
    /// Backend identifier (e.g., "Fs", "Http", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Create a new source error.
    #[must_use]
    pub fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            location: None,
            backend: None,
            source: None,
        }
    }

    /// Attach location context.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Whether retrying the same read may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status != ErrorStatus::Permanent
    }

    /// Create a not found error with location.
    #[must_use]
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound).with_location(location)
    }

    /// Create a source error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, location: Option<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => SourceErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => SourceErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => SourceErrorKind::Timeout,
            _ => SourceErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(l) = location {
            error = error.with_location(l);
        }
        error
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (location: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            SourceErrorKind::NotFound => "Not found",
            SourceErrorKind::PermissionDenied => "Permission denied",
            SourceErrorKind::InvalidLocation => "Invalid location",
            SourceErrorKind::Unavailable => "Unavailable",
            SourceErrorKind::RateLimited => "Rate limited",
            SourceErrorKind::Timeout => "Timeout",
            SourceErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(location) = &self.location {
            write!(f, " (location: {location})")?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Content source for manifests, documents and translation bundles.
///
/// Reads are blocking. Async callers run them on a blocking thread pool.
pub trait ContentSource: Send + Sync {
    /// Read the full UTF-8 text stored at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the location doesn't exist, can't be read,
    /// or the backend is unavailable.
    fn read(&self, location: &str) -> Result<String, SourceError>;

    /// Short human-readable description of the backend (for logs).
    fn describe(&self) -> String;
}

/// Join a root location and a relative path with exactly one slash.
///
/// ```
/// use asdm_source::join_location;
///
/// assert_eq!(join_location("/docs/en-us/", "/intro.md"), "/docs/en-us/intro.md");
/// assert_eq!(join_location("", "intro.md"), "intro.md");
/// ```
#[must_use]
pub fn join_location(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if root.is_empty() {
        path.to_owned()
    } else {
        format!("{root}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_new() {
        let err = SourceError::new(SourceErrorKind::NotFound);

        assert_eq!(err.kind, SourceErrorKind::NotFound);
        assert_eq!(err.status, ErrorStatus::Permanent);
        assert!(err.location.is_none());
        assert!(err.backend.is_none());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_source_error_with_status_is_retryable() {
        let err = SourceError::new(SourceErrorKind::Timeout).with_status(ErrorStatus::Temporary);

        assert!(err.is_retryable());
    }

    #[test]
    fn test_source_error_with_source_downcasts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SourceError::new(SourceErrorKind::NotFound).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_source_error_io_maps_kinds() {
        let not_found = SourceError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            Some("/a.md".to_owned()),
        );
        let denied = SourceError::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            None,
        );
        let timeout = SourceError::io(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"),
            None,
        );

        assert_eq!(not_found.kind, SourceErrorKind::NotFound);
        assert_eq!(not_found.location.as_deref(), Some("/a.md"));
        assert_eq!(denied.kind, SourceErrorKind::PermissionDenied);
        assert_eq!(timeout.kind, SourceErrorKind::Timeout);
        assert_eq!(timeout.status, ErrorStatus::Temporary);
    }

    #[test]
    fn test_source_error_display_simple() {
        let err = SourceError::new(SourceErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_source_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SourceError::new(SourceErrorKind::NotFound)
            .with_backend("Fs")
            .with_location("/docs/intro.md")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (location: /docs/intro.md)"
        );
    }

    #[test]
    fn test_source_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }

    #[test]
    fn test_join_location_normalizes_slashes() {
        assert_eq!(join_location("/docs/", "intro.md"), "/docs/intro.md");
        assert_eq!(join_location("/docs", "/intro.md"), "/docs/intro.md");
        assert_eq!(join_location("/docs", "a/b.md"), "/docs/a/b.md");
        assert_eq!(join_location("/", "intro.md"), "intro.md");
    }
}
