//! Filesystem content source.

use std::path::{Path, PathBuf};

use crate::source::{ContentSource, SourceError, SourceErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Content source reading from a local directory.
///
/// Locations are resolved relative to `root`. Parent-directory segments are
/// rejected so a location never escapes the root.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to a file path under the root.
    fn resolve(&self, location: &str) -> Result<PathBuf, SourceError> {
        let relative = location.trim_start_matches('/');
        let mut path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." || segment.contains('\\') {
                return Err(SourceError::new(SourceErrorKind::InvalidLocation)
                    .with_backend(BACKEND)
                    .with_location(location));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

impl ContentSource for FsSource {
    fn read(&self, location: &str) -> Result<String, SourceError> {
        let path = self.resolve(location)?;
        tracing::debug!(location, path = %path.display(), "Reading file");
        std::fs::read_to_string(&path)
            .map_err(|e| SourceError::io(e, Some(location.to_owned())).with_backend(BACKEND))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}
