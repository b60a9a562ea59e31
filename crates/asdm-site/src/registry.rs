//! Document registry.
//!
//! [`DocumentEntry`] holds one document's manifest metadata plus its body once
//! loaded. [`Registry`] is the ordered, path-indexed collection of entries for
//! one language of one section.
//!
//! Entries are created in bulk from the manifest and mutated exactly once, to
//! attach content. A reload discards the registry and builds a new one.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::Serialize;

use crate::front_matter::FrontMatter;
use crate::route::canonical_route_path;

/// Body of a document after front matter was stripped.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LoadedContent {
    pub(crate) body: String,
    pub(crate) front_matter: FrontMatter,
}

/// Document metadata and lazily attached content.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    /// Storage path relative to the doc root (e.g. `guide/_index.md`).
    pub path: String,
    /// Display name derived from the file name.
    pub name: String,
    /// Title from the manifest, or `name` when the manifest has none.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Explicit sort weight (ascending).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Manifest keys without a dedicated field, kept verbatim.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(skip)]
    loaded: OnceLock<LoadedContent>,
}

impl DocumentEntry {
    /// Create an entry for `path` with derived name and title.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            title: name.clone(),
            name,
            path,
            description: None,
            category: None,
            tags: Vec::new(),
            author: None,
            date: None,
            last_updated: None,
            created: None,
            updated: None,
            read_time: None,
            icon: None,
            weight: None,
            extra: BTreeMap::new(),
            loaded: OnceLock::new(),
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the sort weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Route path this entry is reachable under (`a/b/_index.md` -> `a/b`).
    #[must_use]
    pub fn route_path(&self) -> &str {
        canonical_route_path(&self.path)
    }

    /// Markdown body, if loaded.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.loaded.get().map(|c| c.body.as_str())
    }

    /// Whether the body has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Description from the manifest, else from the document's front matter.
    #[must_use]
    pub fn effective_description(&self) -> Option<&str> {
        self.description.as_deref().or_else(|| {
            self.loaded
                .get()
                .and_then(|c| c.front_matter.description.as_deref())
        })
    }

    /// Category from the manifest, else from the document's front matter.
    #[must_use]
    pub fn effective_category(&self) -> Option<&str> {
        self.category.as_deref().or_else(|| {
            self.loaded
                .get()
                .and_then(|c| c.front_matter.category.as_deref())
        })
    }

    /// Tags from the manifest, else from the document's front matter.
    #[must_use]
    pub fn effective_tags(&self) -> &[String] {
        if !self.tags.is_empty() {
            return &self.tags;
        }
        match self.loaded.get() {
            Some(c) => &c.front_matter.tags,
            None => &[],
        }
    }

    /// Attach loaded content. The first attachment wins.
    pub(crate) fn attach(&self, content: LoadedContent) -> &str {
        self.loaded.get_or_init(|| content).body.as_str()
    }
}

/// Derive a display name from a document path.
///
/// Takes the file name, drops `.md`, turns `-` into spaces and capitalises
/// each word: `guide/getting-started.md` -> `Getting Started`.
fn display_name(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = file.strip_suffix(".md").unwrap_or(file);
    let mut result = String::with_capacity(stem.len());
    for word in stem.split('-').filter(|w| !w.is_empty()) {
        if !result.is_empty() {
            result.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Order of entries in a [`Registry`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistryOrder {
    /// Weight ascending, unweighted entries last, then title
    /// (case-insensitive), then path.
    #[default]
    Weighted,
    /// Manifest order.
    Source,
}

/// Total order used by [`RegistryOrder::Weighted`].
fn weighted_cmp(a: &DocumentEntry, b: &DocumentEntry) -> Ordering {
    let by_weight = match (a.weight, b.weight) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_weight
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.path.cmp(&b.path))
}

/// Ordered collection of document entries with path lookups.
///
/// Paths are assumed unique. When they are not, lookups return the first
/// entry in registry order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<DocumentEntry>,
    path_index: HashMap<String, usize>,
    route_index: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry from manifest documents.
    #[must_use]
    pub fn new(mut documents: Vec<DocumentEntry>, order: RegistryOrder) -> Self {
        if order == RegistryOrder::Weighted {
            documents.sort_by(weighted_cmp);
        }

        let mut path_index = HashMap::with_capacity(documents.len());
        let mut route_index = HashMap::with_capacity(documents.len());
        for (idx, entry) in documents.iter().enumerate() {
            if path_index.contains_key(&entry.path) {
                tracing::debug!(path = %entry.path, "Duplicate document path, keeping first");
                continue;
            }
            path_index.insert(entry.path.clone(), idx);
            route_index
                .entry(entry.route_path().to_owned())
                .or_insert(idx);
        }

        Self {
            entries: documents,
            path_index,
            route_index,
        }
    }

    /// Entries in registry order.
    #[must_use]
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry in registry order.
    #[must_use]
    pub fn first(&self) -> Option<&DocumentEntry> {
        self.entries.first()
    }

    /// Look up an entry by storage path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&DocumentEntry> {
        self.path_index.get(path).map(|&idx| &self.entries[idx])
    }

    /// Look up an entry whose canonical route path equals `route`.
    #[must_use]
    pub fn by_route(&self, route: &str) -> Option<&DocumentEntry> {
        self.route_index.get(route).map(|&idx| &self.entries[idx])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn paths(registry: &Registry) -> Vec<&str> {
        registry.entries().iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_display_name_from_path() {
        assert_eq!(display_name("getting-started.md"), "Getting Started");
        assert_eq!(display_name("guide/api-reference.md"), "Api Reference");
        assert_eq!(display_name("guide/_index.md"), "_index");
        assert_eq!(display_name("README"), "README");
    }

    #[test]
    fn test_new_entry_title_falls_back_to_name() {
        let entry = DocumentEntry::new("core-concepts.md");

        assert_eq!(entry.name, "Core Concepts");
        assert_eq!(entry.title, "Core Concepts");
        assert!(entry.content().is_none());
    }

    #[test]
    fn test_weighted_order_nulls_last_then_title() {
        let registry = Registry::new(
            vec![
                DocumentEntry::new("z.md").with_title("alpha"),
                DocumentEntry::new("b.md").with_title("Beta").with_weight(2.0),
                DocumentEntry::new("a.md").with_title("Zulu").with_weight(1.0),
                DocumentEntry::new("c.md").with_title("Alpha"),
            ],
            RegistryOrder::Weighted,
        );

        // Equal titles (case-insensitive) fall back to path.
        assert_eq!(paths(&registry), vec!["a.md", "b.md", "c.md", "z.md"]);
    }

    #[test]
    fn test_source_order_is_manifest_order() {
        let registry = Registry::new(
            vec![
                DocumentEntry::new("z.md").with_weight(9.0),
                DocumentEntry::new("a.md").with_weight(1.0),
            ],
            RegistryOrder::Source,
        );

        assert_eq!(paths(&registry), vec!["z.md", "a.md"]);
    }

    #[test]
    fn test_lookup_by_path_and_route() {
        let registry = Registry::new(
            vec![
                DocumentEntry::new("guide/_index.md"),
                DocumentEntry::new("guide/setup.md"),
            ],
            RegistryOrder::Source,
        );

        assert_eq!(
            registry.get("guide/setup.md").map(|e| e.path.as_str()),
            Some("guide/setup.md")
        );
        assert_eq!(
            registry.by_route("guide").map(|e| e.path.as_str()),
            Some("guide/_index.md")
        );
        assert_eq!(
            registry.by_route("guide/setup").map(|e| e.path.as_str()),
            Some("guide/setup.md")
        );
        assert!(registry.get("guide").is_none());
    }

    #[test]
    fn test_duplicate_paths_keep_first() {
        let registry = Registry::new(
            vec![
                DocumentEntry::new("a.md").with_title("First"),
                DocumentEntry::new("a.md").with_title("Second"),
            ],
            RegistryOrder::Source,
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a.md").map(|e| e.title.as_str()), Some("First"));
    }

    #[test]
    fn test_attach_sets_content_once() {
        let entry = DocumentEntry::new("a.md");

        let first = entry.attach(LoadedContent {
            body: "first".to_owned(),
            front_matter: FrontMatter::default(),
        });
        assert_eq!(first, "first");

        let second = entry.attach(LoadedContent {
            body: "second".to_owned(),
            front_matter: FrontMatter::default(),
        });
        assert_eq!(second, "first");
        assert_eq!(entry.content(), Some("first"));
    }

    #[test]
    fn test_front_matter_fills_empty_metadata() {
        let entry = DocumentEntry::new("a.md").with_tags(["manifest"]);
        entry.attach(LoadedContent {
            body: String::new(),
            front_matter: FrontMatter {
                title: None,
                description: Some("From front matter".to_owned()),
                category: Some("Guide".to_owned()),
                tags: vec!["ignored".to_owned()],
            },
        });

        assert_eq!(entry.effective_description(), Some("From front matter"));
        assert_eq!(entry.effective_category(), Some("Guide"));
        assert_eq!(entry.effective_tags(), ["manifest".to_owned()]);
    }

    #[test]
    fn test_serialize_skips_empty_and_content() {
        let entry = DocumentEntry::new("intro.md").with_title("Intro");
        entry.attach(LoadedContent {
            body: "body".to_owned(),
            front_matter: FrontMatter::default(),
        });

        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"path": "intro.md", "name": "Intro", "title": "Intro"})
        );
    }
}
