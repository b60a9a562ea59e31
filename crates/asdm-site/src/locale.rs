//! Translation bundles.
//!
//! [`Localizer`] serves UI strings keyed by `(language, namespace, key)`.
//! Bundles are JSON documents read from `{root}/{lang}/{namespace}.json` and
//! cached per `(language, namespace)`. Keys containing dots walk nested
//! objects (`"hero.title"`).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use asdm_source::{ContentSource, SourceError, join_location};
use serde_json::Value;

use crate::route::Language;

/// Error loading a translation bundle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocaleError {
    /// Namespace is empty or contains a path separator.
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
    /// The bundle could not be read.
    #[error("failed to read bundle {location}: {source}")]
    Source {
        location: String,
        #[source]
        source: Arc<SourceError>,
    },
    /// The bundle is not valid JSON.
    #[error("invalid bundle {location}: {message}")]
    Parse { location: String, message: String },
    /// The blocking read task did not complete.
    #[error("load of bundle {location} was interrupted")]
    Interrupted { location: String },
}

type BundleKey = (Language, String);

/// Cached translation bundles read from a content source.
pub struct Localizer {
    source: Arc<dyn ContentSource>,
    root: String,
    bundles: RwLock<HashMap<BundleKey, Arc<Value>>>,
}

impl Localizer {
    /// Create a localizer reading bundles below `root` (e.g. `/locale`).
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, root: impl Into<String>) -> Self {
        Self {
            source,
            root: root.into(),
            bundles: RwLock::new(HashMap::new()),
        }
    }

    /// Register a bundle directly, replacing any cached one.
    #[must_use]
    pub fn with_bundle(self, language: Language, namespace: &str, bundle: Value) -> Self {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((language, namespace.to_owned()), Arc::new(bundle));
        self
    }

    fn location(&self, language: Language, namespace: &str) -> String {
        join_location(
            &self.root,
            &format!("{}/{namespace}.json", language.code()),
        )
    }

    /// Cached bundle, if loaded.
    #[must_use]
    pub fn bundle(&self, language: Language, namespace: &str) -> Option<Arc<Value>> {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(language, namespace.to_owned()))
            .cloned()
    }

    #[must_use]
    pub fn is_loaded(&self, language: Language, namespace: &str) -> bool {
        self.bundle(language, namespace).is_some()
    }

    /// Return the bundle, reading it on first use.
    ///
    /// Failures are logged and not cached.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleError`] if the namespace is invalid or the bundle
    /// cannot be read or parsed.
    pub async fn load(&self, language: Language, namespace: &str) -> Result<Arc<Value>, LocaleError> {
        if let Some(bundle) = self.bundle(language, namespace) {
            return Ok(bundle);
        }

        if namespace.is_empty() || namespace.contains(['/', '\\']) || namespace.contains("..") {
            return Err(LocaleError::InvalidNamespace(namespace.to_owned()));
        }

        let location = self.location(language, namespace);
        let result = self.read(location.clone()).await;
        let bundle = match result {
            Ok(bundle) => Arc::new(bundle),
            Err(e) => {
                tracing::warn!(%language, namespace, error = %e, "Failed to load translations");
                return Err(e);
            }
        };

        tracing::debug!(%language, namespace, %location, "Loaded translations");
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((language, namespace.to_owned()), Arc::clone(&bundle));
        Ok(bundle)
    }

    async fn read(&self, location: String) -> Result<Value, LocaleError> {
        let source = Arc::clone(&self.source);
        let read_location = location.clone();
        let text = match tokio::task::spawn_blocking(move || source.read(&read_location)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(LocaleError::Source {
                    location,
                    source: Arc::new(e),
                });
            }
            Err(_) => return Err(LocaleError::Interrupted { location }),
        };

        serde_json::from_str(&text).map_err(|e| LocaleError::Parse {
            location,
            message: e.to_string(),
        })
    }

    /// Look up a string in a cached bundle.
    ///
    /// Returns `None` if the bundle is not loaded, the key is missing or the
    /// value is not a string.
    #[must_use]
    pub fn translate(&self, language: Language, namespace: &str, key: &str) -> Option<String> {
        let bundle = self.bundle(language, namespace)?;
        let value = key
            .split('.')
            .try_fold(bundle.as_ref(), |value, part| value.get(part))?;
        value.as_str().map(str::to_owned)
    }

    /// Like [`translate`](Self::translate), falling back to `fallback`.
    #[must_use]
    pub fn text(&self, language: Language, namespace: &str, key: &str, fallback: &str) -> String {
        self.translate(language, namespace, key)
            .unwrap_or_else(|| fallback.to_owned())
    }
}
