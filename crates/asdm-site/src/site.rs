//! Per-language site snapshots.
//!
//! A [`SiteSnapshot`] is everything derived from one manifest fetch: the
//! registry, the menu tree and a content loader bound to the manifest's doc
//! root. [`Site`] caches one snapshot per language for a section.
//!
//! # Thread Safety
//!
//! `Site` is designed for concurrent access:
//! - `snapshot()` returns `Arc<SiteSnapshot>` with minimal locking on the fast path
//! - loads are serialized by an async mutex with double-checked lookup
//! - `invalidate()` drops all cached snapshots; readers holding one keep it

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use asdm_source::{ContentSource, SourceError};
use serde::Serialize;

use crate::loader::{ContentLoader, LoadError};
use crate::manifest::{Diagnostic, SiteManifest};
use crate::menu::{self, BreadcrumbItem, MenuNode, NavItem};
use crate::registry::{DocumentEntry, Registry};
use crate::route::{Language, Section};

/// Error loading a section's manifest.
///
/// Fatal for the current view. The caller may retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SiteError {
    /// The manifest could not be fetched.
    #[error("manifest {location} ({language}) unavailable: {source}")]
    ManifestUnavailable {
        location: String,
        language: Language,
        #[source]
        source: Arc<SourceError>,
    },
    /// The blocking read task did not complete.
    #[error("manifest {location} load was interrupted")]
    Interrupted { location: String },
}

/// Whether a page's body could be shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ContentStatus {
    /// Body loaded.
    Loaded,
    /// Body could not be loaded; metadata is still valid.
    Unavailable { reason: String, retryable: bool },
    /// No document resolved, nothing to load.
    NoDocument,
}

/// Everything needed to render one route.
#[derive(Clone, Debug, PartialEq)]
pub struct PageView {
    pub language: Language,
    /// Route path as requested (prefix and language stripped).
    pub route_path: String,
    /// Resolved document, if any.
    pub document: Option<DocumentEntry>,
    /// Markdown body without front matter.
    pub body: Option<String>,
    pub content_status: ContentStatus,
    pub breadcrumbs: Vec<BreadcrumbItem>,
    /// Menu paths expanded to reveal the document.
    pub expanded: BTreeSet<String>,
}

/// Registry, menu tree and loader built from one manifest.
pub struct SiteSnapshot {
    language: Language,
    section: Section,
    manifest_location: String,
    registry: Registry,
    menu_tree: Option<Vec<MenuNode>>,
    diagnostics: Vec<Diagnostic>,
    loader: ContentLoader,
}

/// Directory part of a location (`/docs/en-us/site-tree.yml` -> `/docs/en-us`).
fn parent_location(location: &str) -> &str {
    location.rsplit_once('/').map_or("", |(dir, _)| dir)
}

impl SiteSnapshot {
    /// Fetch and parse the section's manifest for `language`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the manifest cannot be read. Malformed
    /// manifest lines are not errors; they are kept as diagnostics.
    pub async fn load(
        source: Arc<dyn ContentSource>,
        section: &Section,
        language: Language,
    ) -> Result<Self, SiteError> {
        let location = section.manifest_location(language);
        tracing::debug!(section = %section.name, %language, %location, "Loading manifest");

        let reader = Arc::clone(&source);
        let read_location = location.clone();
        let text = match tokio::task::spawn_blocking(move || reader.read(&read_location)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(%location, error = %e, "Manifest unavailable");
                return Err(SiteError::ManifestUnavailable {
                    location,
                    language,
                    source: Arc::new(e),
                });
            }
            Err(_) => return Err(SiteError::Interrupted { location }),
        };

        let (manifest, diagnostics) = SiteManifest::parse_with_diagnostics(&text);
        for diagnostic in &diagnostics {
            tracing::debug!(%location, %diagnostic, "Skipped manifest line");
        }

        Ok(Self::from_manifest(
            source,
            section,
            language,
            location,
            manifest,
            diagnostics,
        ))
    }

    /// Build a snapshot from an already parsed manifest.
    ///
    /// Bodies are read below the manifest's `docRoot`, or next to the manifest
    /// when it declares none.
    #[must_use]
    pub fn from_manifest(
        source: Arc<dyn ContentSource>,
        section: &Section,
        language: Language,
        manifest_location: String,
        manifest: SiteManifest,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let doc_root = if manifest.doc_root.is_empty() {
            parent_location(&manifest_location).to_owned()
        } else {
            manifest.doc_root
        };
        let registry = Registry::new(manifest.documents, section.order);

        tracing::info!(
            section = %section.name,
            %language,
            documents = registry.len(),
            menu = manifest.menu_tree.is_some(),
            "Site loaded"
        );

        Self {
            language,
            section: section.clone(),
            manifest_location,
            registry,
            menu_tree: manifest.menu_tree,
            diagnostics,
            loader: ContentLoader::new(source).with_doc_root(doc_root),
        }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn section(&self) -> &Section {
        &self.section
    }

    #[must_use]
    pub fn manifest_location(&self) -> &str {
        &self.manifest_location
    }

    /// Base location document bodies are read from.
    #[must_use]
    pub fn doc_root(&self) -> &str {
        self.loader.doc_root()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn menu_tree(&self) -> Option<&[MenuNode]> {
        self.menu_tree.as_deref()
    }

    /// Lines skipped while parsing the manifest.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolve a route path to a document.
    #[must_use]
    pub fn resolve(&self, route_path: &str) -> Option<&DocumentEntry> {
        self.section
            .resolve(route_path, &self.registry, self.menu_tree())
    }

    /// Menu paths to expand so `document` is visible.
    #[must_use]
    pub fn expanded_for(&self, document: &DocumentEntry) -> BTreeSet<String> {
        self.menu_tree()
            .map(|forest| menu::expand_to_reveal(forest, &document.path))
            .unwrap_or_default()
    }

    /// Sidebar for the given expansion state and current document path.
    #[must_use]
    pub fn navigation(&self, expanded: &BTreeSet<String>, current: Option<&str>) -> Vec<NavItem> {
        menu::navigation(&self.registry, self.menu_tree(), expanded, current)
    }

    /// Breadcrumbs for `document`.
    #[must_use]
    pub fn breadcrumbs(&self, document: &DocumentEntry) -> Vec<BreadcrumbItem> {
        menu::breadcrumbs(&self.registry, self.menu_tree(), document)
    }

    /// Load a document's body (at most one fetch per document).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the body cannot be fetched.
    pub async fn load_content<'a>(&self, document: &'a DocumentEntry) -> Result<&'a str, LoadError> {
        self.loader.load(document).await
    }

    /// Resolve a route and load what is needed to render it.
    ///
    /// Never fails: an unresolved route and an unavailable body are states of
    /// the returned view.
    pub async fn page(&self, route_path: &str) -> PageView {
        let Some(document) = self.resolve(route_path) else {
            return PageView {
                language: self.language,
                route_path: route_path.to_owned(),
                document: None,
                body: None,
                content_status: ContentStatus::NoDocument,
                breadcrumbs: Vec::new(),
                expanded: BTreeSet::new(),
            };
        };

        let (body, content_status) = match self.load_content(document).await {
            Ok(body) => (Some(body.to_owned()), ContentStatus::Loaded),
            Err(e) => (
                None,
                ContentStatus::Unavailable {
                    reason: e.to_string(),
                    retryable: e.is_retryable(),
                },
            ),
        };

        PageView {
            language: self.language,
            route_path: route_path.to_owned(),
            document: Some(document.clone()),
            body,
            content_status,
            breadcrumbs: self.breadcrumbs(document),
            expanded: self.expanded_for(document),
        }
    }
}

/// Section site with one cached snapshot per language.
pub struct Site {
    source: Arc<dyn ContentSource>,
    section: Section,
    snapshots: RwLock<HashMap<Language, Arc<SiteSnapshot>>>,
    /// Serializes manifest loads.
    reload_lock: tokio::sync::Mutex<()>,
}

impl Site {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, section: Section) -> Self {
        Self {
            source,
            section,
            snapshots: RwLock::new(HashMap::new()),
            reload_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn section(&self) -> &Section {
        &self.section
    }

    fn cached(&self, language: Language) -> Option<Arc<SiteSnapshot>> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&language)
            .cloned()
    }

    /// Snapshot for `language`, loading the manifest if needed.
    ///
    /// Failed loads are not cached; the next call retries.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the manifest cannot be read.
    pub async fn snapshot(&self, language: Language) -> Result<Arc<SiteSnapshot>, SiteError> {
        if let Some(snapshot) = self.cached(language) {
            return Ok(snapshot);
        }

        let _guard = self.reload_lock.lock().await;
        if let Some(snapshot) = self.cached(language) {
            return Ok(snapshot);
        }

        let snapshot =
            Arc::new(SiteSnapshot::load(Arc::clone(&self.source), &self.section, language).await?);
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop all cached snapshots so the next request reloads manifests.
    pub fn invalidate(&self) {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!(section = %self.section.name, "Site invalidated");
    }
}

#[cfg(test)]
mod tests {
    use asdm_source::{MockSource, SourceErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::route::EmptyRoute;

    const EN_MANIFEST: &str = "\
docRoot: /docs/en-us
documents:
  - title: Guide
    path: guide/_index.md
  - title: Install
    path: guide/install.md
  - title: FAQ
    path: faq.md
menu-tree:
  - path: guide/_index.md
    children:
      - path: guide/install.md
  - path: faq.md
";

    fn section() -> Section {
        Section::new("docs", "docs", "/docs/{lang}/site-tree.yml")
    }

    fn source() -> Arc<MockSource> {
        Arc::new(
            MockSource::new()
                .with_text("/docs/en-us/site-tree.yml", EN_MANIFEST)
                .with_text("/docs/en-us/guide/install.md", "---\ntitle: x\n---\n# Install\n")
                .with_text("/docs/zh-cn/site-tree.yml", "documents:\n  - path: intro.md\n")
                .with_text("/docs/zh-cn/intro.md", "# 介绍"),
        )
    }

    #[test]
    fn test_parent_location() {
        assert_eq!(parent_location("/docs/en-us/site-tree.yml"), "/docs/en-us");
        assert_eq!(parent_location("site-tree.yml"), "");
    }

    #[tokio::test]
    async fn test_snapshot_load_builds_registry() {
        let snapshot = SiteSnapshot::load(source(), &section(), Language::EnUs)
            .await
            .unwrap();

        assert_eq!(snapshot.registry().len(), 3);
        assert_eq!(snapshot.doc_root(), "/docs/en-us");
        assert_eq!(snapshot.manifest_location(), "/docs/en-us/site-tree.yml");
        assert!(snapshot.menu_tree().is_some());
        assert!(snapshot.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_doc_root_defaults_to_manifest_directory() {
        let snapshot = SiteSnapshot::load(source(), &section(), Language::ZhCn)
            .await
            .unwrap();

        assert_eq!(snapshot.doc_root(), "/docs/zh-cn");
        let page = snapshot.page("intro").await;
        assert_eq!(page.body.as_deref(), Some("# 介绍"));
    }

    #[tokio::test]
    async fn test_snapshot_manifest_failure() {
        let source = Arc::new(
            MockSource::new()
                .with_failure("/docs/en-us/site-tree.yml", SourceErrorKind::Unavailable),
        );

        let result = SiteSnapshot::load(source, &section(), Language::EnUs).await;

        assert!(matches!(
            result,
            Err(SiteError::ManifestUnavailable {
                language: Language::EnUs,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_page_with_content() {
        let snapshot = SiteSnapshot::load(source(), &section(), Language::EnUs)
            .await
            .unwrap();

        let page = snapshot.page("guide/install").await;

        assert_eq!(page.content_status, ContentStatus::Loaded);
        assert_eq!(page.body.as_deref(), Some("# Install\n"));
        assert_eq!(
            page.document.map(|d| d.path),
            Some("guide/install.md".to_owned())
        );
        assert_eq!(
            page.expanded,
            BTreeSet::from(["guide/_index.md".to_owned()])
        );
        let crumbs: Vec<_> = page.breadcrumbs.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(crumbs, vec!["Home", "Guide"]);
    }

    #[tokio::test]
    async fn test_page_content_unavailable_keeps_metadata() {
        let snapshot = SiteSnapshot::load(source(), &section(), Language::EnUs)
            .await
            .unwrap();

        let page = snapshot.page("faq").await;

        assert_eq!(page.document.map(|d| d.title), Some("FAQ".to_owned()));
        assert!(page.body.is_none());
        assert!(matches!(
            page.content_status,
            ContentStatus::Unavailable {
                retryable: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_page_unresolved_route() {
        let snapshot = SiteSnapshot::load(source(), &section(), Language::EnUs)
            .await
            .unwrap();

        let page = snapshot.page("nope").await;

        assert_eq!(page.content_status, ContentStatus::NoDocument);
        assert!(page.document.is_none());
    }

    #[tokio::test]
    async fn test_empty_route_index_policy() {
        let section = section().with_empty_route(EmptyRoute::Index);
        let snapshot = SiteSnapshot::load(source(), &section, Language::EnUs)
            .await
            .unwrap();

        assert!(snapshot.resolve("").is_none());
    }

    #[tokio::test]
    async fn test_site_caches_snapshot_per_language() {
        let source = source();
        let site = Site::new(Arc::clone(&source) as Arc<dyn ContentSource>, section());

        let first = site.snapshot(Language::EnUs).await.unwrap();
        let second = site.snapshot(Language::EnUs).await.unwrap();
        let zh = site.snapshot(Language::ZhCn).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(zh.language(), Language::ZhCn);
        assert_eq!(source.read_count("/docs/en-us/site-tree.yml"), 1);
    }

    #[tokio::test]
    async fn test_site_invalidate_reloads() {
        let source = source();
        let site = Site::new(Arc::clone(&source) as Arc<dyn ContentSource>, section());

        let before = site.snapshot(Language::EnUs).await.unwrap();
        source.set_text("/docs/en-us/site-tree.yml", "documents:\n  - path: only.md\n");
        site.invalidate();
        let after = site.snapshot(Language::EnUs).await.unwrap();

        assert_eq!(before.registry().len(), 3);
        assert_eq!(after.registry().len(), 1);
        assert_eq!(source.read_count("/docs/en-us/site-tree.yml"), 2);
    }

    #[tokio::test]
    async fn test_site_failed_load_not_cached() {
        let source = Arc::new(MockSource::new());
        let site = Site::new(Arc::clone(&source) as Arc<dyn ContentSource>, section());

        assert!(site.snapshot(Language::EnUs).await.is_err());
        source.set_text("/docs/en-us/site-tree.yml", "documents:\n  - path: a.md\n");
        let snapshot = site.snapshot(Language::EnUs).await.unwrap();

        assert_eq!(snapshot.registry().len(), 1);
    }

    #[test]
    fn test_content_status_serialization() {
        let json = serde_json::to_value(ContentStatus::Unavailable {
            reason: "down".to_owned(),
            retryable: true,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({"status": "unavailable", "reason": "down", "retryable": true})
        );
    }
}
