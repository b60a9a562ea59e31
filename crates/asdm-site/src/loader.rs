//! Lazy document content loading.
//!
//! [`ContentLoader`] fetches a document body the first time it is needed,
//! strips front matter and attaches the result to the registry entry. An
//! entry is fetched at most once: later loads return the attached body, and
//! concurrent loads of the same path share a single in-flight fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use asdm_source::{ContentSource, SourceError, join_location};
use tokio::sync::OnceCell;

use crate::front_matter::split_front_matter;
use crate::registry::{DocumentEntry, LoadedContent};

/// Error loading a document body.
///
/// Recoverable: the entry keeps its metadata and can be loaded again later.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The content source failed.
    #[error("failed to load {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: Arc<SourceError>,
    },
    /// The blocking read task did not complete.
    #[error("load of {path} was interrupted")]
    Interrupted { path: String },
}

impl LoadError {
    /// Whether retrying may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source { source, .. } => source.is_retryable(),
            Self::Interrupted { .. } => true,
        }
    }
}

type InFlight = Arc<OnceCell<Result<LoadedContent, LoadError>>>;

/// Fetches document bodies from a [`ContentSource`].
pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    doc_root: String,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl ContentLoader {
    /// Create a loader reading bodies relative to the source root.
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            doc_root: String::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Read bodies from `{doc_root}/{path}`.
    #[must_use]
    pub fn with_doc_root(mut self, doc_root: impl Into<String>) -> Self {
        self.doc_root = doc_root.into();
        self
    }

    /// Base location bodies are read from.
    #[must_use]
    pub fn doc_root(&self) -> &str {
        &self.doc_root
    }

    /// Return the entry's body, fetching it if it is not loaded yet.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the fetch fails. The entry is left untouched.
    pub async fn load<'e>(&self, entry: &'e DocumentEntry) -> Result<&'e str, LoadError> {
        if let Some(content) = entry.content() {
            return Ok(content);
        }

        let cell = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entry.path.clone())
            .or_default()
            .clone();

        // A fetch may have finished between the first check and taking the cell.
        if let Some(content) = entry.content() {
            return Ok(content);
        }

        let result = cell
            .get_or_init(|| self.fetch(entry.path.clone()))
            .await
            .clone();

        let outcome = match result {
            Ok(loaded) => Ok(entry.attach(loaded)),
            Err(e) => {
                tracing::warn!(path = %entry.path, error = %e, "Failed to load document");
                Err(e)
            }
        };

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(&entry.path)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(&entry.path);
        }

        outcome
    }

    /// Read and split one document on the blocking pool.
    async fn fetch(&self, path: String) -> Result<LoadedContent, LoadError> {
        let location = join_location(&self.doc_root, &path);
        tracing::debug!(%location, "Loading document");

        let source = Arc::clone(&self.source);
        let read = tokio::task::spawn_blocking(move || source.read(&location)).await;

        let text = match read {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(LoadError::Source {
                    path,
                    source: Arc::new(e),
                });
            }
            Err(_) => return Err(LoadError::Interrupted { path }),
        };

        let (front_matter, body) = split_front_matter(&text);
        Ok(LoadedContent {
            body: body.to_owned(),
            front_matter: front_matter.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use asdm_source::{MockSource, SourceErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;

    fn loader(source: &Arc<MockSource>) -> ContentLoader {
        ContentLoader::new(Arc::clone(source) as Arc<dyn ContentSource>).with_doc_root("/docs")
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let source = Arc::new(MockSource::new().with_text("/docs/intro.md", "# Intro"));
        let loader = loader(&source);
        let entry = DocumentEntry::new("intro.md");

        let first = loader.load(&entry).await.unwrap();
        assert_eq!(first, "# Intro");
        let second = loader.load(&entry).await.unwrap();
        assert_eq!(second, "# Intro");

        assert_eq!(source.read_count("/docs/intro.md"), 1);
    }

    #[tokio::test]
    async fn test_load_strips_front_matter_and_fills_metadata() {
        let source = Arc::new(MockSource::new().with_text(
            "/docs/intro.md",
            "---\ndescription: Start here\ntags: a, b\n---\n# Intro\n",
        ));
        let loader = loader(&source);
        let entry = DocumentEntry::new("intro.md");

        let body = loader.load(&entry).await.unwrap();

        assert_eq!(body, "# Intro\n");
        assert_eq!(entry.effective_description(), Some("Start here"));
        assert_eq!(entry.effective_tags(), ["a".to_owned(), "b".to_owned()]);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = Arc::new(
            MockSource::new()
                .with_text("/docs/slow.md", "slow body")
                .with_delay("/docs/slow.md", Duration::from_millis(50)),
        );
        let loader = loader(&source);
        let entry = DocumentEntry::new("slow.md");

        let (a, b) = tokio::join!(loader.load(&entry), loader.load(&entry));

        assert_eq!(a.unwrap(), "slow body");
        assert_eq!(b.unwrap(), "slow body");
        assert_eq!(source.read_count("/docs/slow.md"), 1);
    }

    #[tokio::test]
    async fn test_different_paths_load_independently() {
        let source = Arc::new(
            MockSource::new()
                .with_text("/docs/a.md", "A")
                .with_text("/docs/b.md", "B"),
        );
        let loader = loader(&source);
        let a = DocumentEntry::new("a.md");
        let b = DocumentEntry::new("b.md");

        let (ra, rb) = tokio::join!(loader.load(&a), loader.load(&b));

        assert_eq!(ra.unwrap(), "A");
        assert_eq!(rb.unwrap(), "B");
        assert_eq!(source.total_reads(), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_entry_untouched_and_allows_retry() {
        let source = Arc::new(
            MockSource::new().with_failure("/docs/down.md", SourceErrorKind::Unavailable),
        );
        let loader = loader(&source);
        let entry = DocumentEntry::new("down.md");

        let err = loader.load(&entry).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("down.md"));
        assert!(!entry.is_loaded());

        let _ = loader.load(&entry).await;
        assert_eq!(source.read_count("/docs/down.md"), 2);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_retryable() {
        let source = Arc::new(MockSource::new());
        let loader = loader(&source);
        let entry = DocumentEntry::new("missing.md");

        let err = loader.load(&entry).await.unwrap_err();

        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_preloaded_entry_skips_fetch() {
        let source = Arc::new(MockSource::new().with_text("/docs/a.md", "fresh"));
        let loader = loader(&source);
        let entry = DocumentEntry::new("a.md");
        entry.attach(LoadedContent {
            body: "cached".to_owned(),
            front_matter: crate::front_matter::FrontMatter::default(),
        });

        assert_eq!(loader.load(&entry).await.unwrap(), "cached");
        assert_eq!(source.total_reads(), 0);
    }

    #[test]
    fn test_doc_root_default_is_empty() {
        let loader = ContentLoader::new(Arc::new(MockSource::new()));

        assert_eq!(loader.doc_root(), "");
    }
}
