//! Route resolution.
//!
//! Maps browser locations (`/docs/zh-cn/guide/setup?x=1#top`) to registry
//! entries. A [`Section`] describes one content-browsing surface: its route
//! prefix, where its manifest lives, how its registry is ordered and what an
//! empty route means.
//!
//! # Resolution
//!
//! [`Section::resolve`] tries, in order:
//! 1. strip the section prefix if present;
//! 2. empty path: first document of the menu tree, else the first registry
//!    entry (or nothing, for sections showing an index view);
//! 3. exact match on the canonical route path of each entry;
//! 4. the path as a directory with an implicit `_index.md`;
//! 5. a path ending in `/_index`, with that suffix removed;
//! 6. nothing.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::menu::{MenuNode, first_document};
use crate::registry::{DocumentEntry, Registry, RegistryOrder};

/// Placeholder replaced by the language code in manifest locations.
const LANGUAGE_PLACEHOLDER: &str = "{lang}";

/// Content language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-us")]
    EnUs,
    #[serde(rename = "zh-cn")]
    ZhCn,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 2] = [Language::EnUs, Language::ZhCn];

    /// Language code used in routes and content locations.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en-us",
            Self::ZhCn => "zh-cn",
        }
    }

    /// Match an exact route code (`en-us`, `zh-cn`).
    ///
    /// Unlike [`FromStr`], aliases and other casings are rejected so that a
    /// directory named `zh` or `EN` stays part of the route path.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| language.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en-us" | "en" => Ok(Self::EnUs),
            "zh-cn" | "zh" => Ok(Self::ZhCn),
            _ => Err(UnknownLanguage(s.to_owned())),
        }
    }
}

/// What an empty route path resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyRoute {
    /// First document of the menu tree, else the first registry entry.
    #[default]
    FirstDocument,
    /// No document; the section shows its index view.
    Index,
}

/// Location split into language and route path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTarget {
    /// Language segment, when the location carries one.
    pub language: Option<Language>,
    /// Route path without prefix, language or surrounding slashes.
    pub path: String,
}

/// A content-browsing surface (documentation, blog).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    /// Section name (e.g. `docs`).
    pub name: String,
    /// Leading route segment (e.g. `docs`).
    pub prefix: String,
    /// Manifest location; `{lang}` is replaced by the language code.
    pub manifest: String,
    /// Registry order.
    pub order: RegistryOrder,
    /// Empty-route policy.
    pub empty_route: EmptyRoute,
}

impl Section {
    /// Create a section with weighted order and first-document empty routes.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        manifest: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            manifest: manifest.into(),
            order: RegistryOrder::Weighted,
            empty_route: EmptyRoute::FirstDocument,
        }
    }

    /// Set the registry order.
    #[must_use]
    pub fn with_order(mut self, order: RegistryOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the empty-route policy.
    #[must_use]
    pub fn with_empty_route(mut self, empty_route: EmptyRoute) -> Self {
        self.empty_route = empty_route;
        self
    }

    /// Manifest location for a language.
    #[must_use]
    pub fn manifest_location(&self, language: Language) -> String {
        self.manifest.replace(LANGUAGE_PLACEHOLDER, language.code())
    }

    /// Split a browser location into language and route path.
    ///
    /// Drops the query string and fragment, percent-decodes, then hands the
    /// result to [`parse_route_path`](Self::parse_route_path).
    #[must_use]
    pub fn parse_location(&self, location: &str) -> RouteTarget {
        let location = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        self.parse_route_path(&percent_decode_str(location).decode_utf8_lossy())
    }

    /// Split an already-decoded route path into language and route path.
    ///
    /// Strips the section prefix and a leading language segment when present.
    /// Only exact language codes count as a language segment. No further
    /// decoding is done, so a literal `%20` stays as written.
    #[must_use]
    pub fn parse_route_path(&self, route_path: &str) -> RouteTarget {
        let mut segments = route_path
            .split('/')
            .filter(|s| !s.is_empty())
            .peekable();
        if segments.peek() == Some(&self.prefix.as_str()) {
            segments.next();
        }
        let language = segments.peek().and_then(|s| Language::from_code(s));
        if language.is_some() {
            segments.next();
        }

        RouteTarget {
            language,
            path: segments.collect::<Vec<_>>().join("/"),
        }
    }

    /// Strip the section prefix and surrounding slashes from a route path.
    fn strip_prefix<'a>(&self, route_path: &'a str) -> &'a str {
        let trimmed = route_path.trim_matches('/');
        match trimmed.strip_prefix(self.prefix.as_str()) {
            Some("") => "",
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => trimmed,
        }
    }

    /// Resolve a route path to a registry entry.
    ///
    /// `None` is a valid outcome (nothing selected / not found), not an error.
    #[must_use]
    pub fn resolve<'a>(
        &self,
        route_path: &str,
        registry: &'a Registry,
        menu_tree: Option<&[MenuNode]>,
    ) -> Option<&'a DocumentEntry> {
        let path = self.strip_prefix(route_path);

        if path.is_empty() {
            return match self.empty_route {
                EmptyRoute::Index => None,
                EmptyRoute::FirstDocument => menu_tree
                    .and_then(|forest| first_document(forest, registry))
                    .or_else(|| registry.first()),
            };
        }

        if let Some(entry) = registry.by_route(path) {
            return Some(entry);
        }

        if let Some(entry) = registry.get(&format!("{path}/_index.md")) {
            return Some(entry);
        }

        path.strip_suffix("/_index")
            .and_then(|dir| registry.by_route(canonical_route_path(dir)))
    }
}

/// Reduce a document path to its route form.
///
/// `a/b/_index.md` becomes `a/b`, `a/b.md` becomes `a/b`; anything else is
/// returned unchanged. Backslash separators before `_index.md` are accepted.
///
/// ```
/// use asdm_site::canonical_route_path;
///
/// assert_eq!(canonical_route_path("guide/_index.md"), "guide");
/// assert_eq!(canonical_route_path("guide/setup.md"), "guide/setup");
/// ```
#[must_use]
pub fn canonical_route_path(doc_path: &str) -> &str {
    if let Some(dir) = doc_path
        .strip_suffix("/_index.md")
        .or_else(|| doc_path.strip_suffix("\\_index.md"))
    {
        return dir;
    }
    doc_path.strip_suffix(".md").unwrap_or(doc_path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn docs_section() -> Section {
        Section::new("docs", "docs", "/docs/{lang}/site-tree.yml")
    }

    fn registry(paths: &[&str]) -> Registry {
        Registry::new(
            paths.iter().map(|p| DocumentEntry::new(*p)).collect(),
            RegistryOrder::Source,
        )
    }

    fn resolved<'a>(entry: Option<&'a DocumentEntry>) -> Option<&'a str> {
        entry.map(|e| e.path.as_str())
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("en-us".parse::<Language>(), Ok(Language::EnUs));
        assert_eq!("ZH-CN".parse::<Language>(), Ok(Language::ZhCn));
        assert_eq!("zh".parse::<Language>(), Ok(Language::ZhCn));
        assert!("fr-fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serializes_as_code() {
        assert_eq!(
            serde_json::to_string(&Language::ZhCn).unwrap(),
            "\"zh-cn\""
        );
        assert_eq!(Language::EnUs.to_string(), "en-us");
    }

    #[test]
    fn test_manifest_location_substitutes_language() {
        let section = docs_section();

        assert_eq!(
            section.manifest_location(Language::ZhCn),
            "/docs/zh-cn/site-tree.yml"
        );
    }

    #[test]
    fn test_canonical_route_path() {
        assert_eq!(canonical_route_path("a/b/_index.md"), "a/b");
        assert_eq!(canonical_route_path("a\\b\\_index.md"), "a\\b");
        assert_eq!(canonical_route_path("a/b.md"), "a/b");
        assert_eq!(canonical_route_path("_index.md"), "_index");
        assert_eq!(canonical_route_path("a/b"), "a/b");
    }

    #[test]
    fn test_parse_location_strips_prefix_and_language() {
        let section = docs_section();

        assert_eq!(
            section.parse_location("/docs/zh-cn/guide/setup"),
            RouteTarget {
                language: Some(Language::ZhCn),
                path: "guide/setup".to_owned(),
            }
        );
        assert_eq!(
            section.parse_location("/docs/guide/"),
            RouteTarget {
                language: None,
                path: "guide".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_location_drops_query_and_fragment() {
        let section = docs_section();

        let target = section.parse_location("/docs/en-us/intro?tab=1#install");

        assert_eq!(target.language, Some(Language::EnUs));
        assert_eq!(target.path, "intro");
    }

    #[test]
    fn test_parse_location_percent_decodes() {
        let section = docs_section();

        let target = section.parse_location("/docs/zh-cn/%E6%8C%87%E5%8D%97/intro%20page");

        assert_eq!(target.path, "指南/intro page");
    }

    #[test]
    fn test_parse_location_empty() {
        let section = docs_section();

        assert_eq!(section.parse_location("/docs").path, "");
        assert_eq!(section.parse_location("/docs/en-us/").path, "");
        assert_eq!(section.parse_location("").path, "");
    }

    #[test]
    fn test_parse_location_only_exact_language_codes() {
        let section = Section::new("docs", "docs", "/docs/{lang}/site-tree.yml");

        assert_eq!(
            section.parse_location("/docs/zh/intro"),
            RouteTarget {
                language: None,
                path: "zh/intro".to_owned(),
            }
        );
        assert_eq!(section.parse_location("/docs/EN/setup").language, None);
        assert_eq!(
            section.parse_location("/docs/ZH-CN/setup").path,
            "ZH-CN/setup"
        );
        assert_eq!(Language::from_code("zh-cn"), Some(Language::ZhCn));
        assert_eq!(Language::from_code("zh"), None);
    }

    #[test]
    fn test_parse_route_path_does_not_decode() {
        let section = Section::new("docs", "docs", "/docs/{lang}/site-tree.yml");

        let target = section.parse_route_path("docs/en-us/guide/100%20percent");

        assert_eq!(target.language, Some(Language::EnUs));
        assert_eq!(target.path, "guide/100%20percent");
        assert_eq!(
            section.parse_location("/docs/guide/100%2520percent").path,
            "guide/100%20percent"
        );
    }

    #[test]
    fn test_parse_location_blog_language_segment() {
        let section = Section::new("blog", "blog", "/blogs/content/site-tree.yml");

        let target = section.parse_location("/blog/zh-cn/2024/release-notes");

        assert_eq!(target.language, Some(Language::ZhCn));
        assert_eq!(target.path, "2024/release-notes");
    }

    #[test]
    fn test_resolve_index_document() {
        let registry = registry(&["intro.md", "a/b/_index.md"]);

        let entry = docs_section().resolve("a/b", &registry, None);

        assert_eq!(resolved(entry), Some("a/b/_index.md"));
    }

    #[test]
    fn test_resolve_plain_document() {
        let registry = registry(&["intro.md", "a/b.md"]);

        let entry = docs_section().resolve("a/b", &registry, None);

        assert_eq!(resolved(entry), Some("a/b.md"));
    }

    #[test]
    fn test_resolve_strips_prefix() {
        let registry = registry(&["intro.md"]);
        let section = docs_section();

        assert_eq!(
            resolved(section.resolve("/docs/intro", &registry, None)),
            Some("intro.md")
        );
        // A path that merely starts with the prefix text is not stripped.
        assert_eq!(resolved(section.resolve("docsintro", &registry, None)), None);
    }

    #[test]
    fn test_resolve_trailing_index_suffix() {
        let registry = registry(&["guide/_index.md"]);

        let entry = docs_section().resolve("guide/_index", &registry, None);

        assert_eq!(resolved(entry), Some("guide/_index.md"));
    }

    #[test]
    fn test_resolve_exact_match_wins_over_directory_index() {
        // "guide.md" and "guide/_index.md" share the route "guide"; the
        // first in registry order wins the exact match.
        let registry = registry(&["guide.md", "guide/_index.md"]);

        let entry = docs_section().resolve("guide", &registry, None);

        assert_eq!(resolved(entry), Some("guide.md"));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let registry = registry(&["intro.md"]);

        assert!(docs_section().resolve("missing", &registry, None).is_none());
    }

    #[test]
    fn test_resolve_empty_prefers_menu_tree() {
        let registry = registry(&["zzz.md", "start.md"]);
        let menu = vec![MenuNode::new("start.md")];

        let entry = docs_section().resolve("", &registry, Some(&menu));

        assert_eq!(resolved(entry), Some("start.md"));
    }

    #[test]
    fn test_resolve_empty_skips_menu_nodes_without_document() {
        let registry = registry(&["zzz.md", "second.md"]);
        let menu = vec![
            MenuNode::new("ghost.md").with_children(vec![MenuNode::new("second.md")]),
        ];

        let entry = docs_section().resolve("", &registry, Some(&menu));

        assert_eq!(resolved(entry), Some("zzz.md"));
    }

    #[test]
    fn test_resolve_empty_without_menu_uses_registry_order() {
        let registry = registry(&["first.md", "second.md"]);

        let entry = docs_section().resolve("/docs/", &registry, None);

        assert_eq!(resolved(entry), Some("first.md"));
    }

    #[test]
    fn test_resolve_empty_index_policy() {
        let registry = registry(&["first.md"]);
        let section = docs_section().with_empty_route(EmptyRoute::Index);

        assert!(section.resolve("", &registry, None).is_none());
    }
}
