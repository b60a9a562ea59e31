//! Single-reader navigation state.
//!
//! A [`ReaderSession`] follows one reader through a section: it parses the
//! location, (re)loads the manifest when the language changes, resolves the
//! route, loads the body and recomputes the expanded menu set. Each
//! navigation takes a sequence number; a navigation that finishes after a
//! newer one started is discarded instead of overwriting the route state.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use asdm_source::ContentSource;
use serde::Serialize;

use crate::menu::{BreadcrumbItem, NavItem, SidebarState};
use crate::route::{Language, Section};
use crate::site::{PageView, SiteError, SiteSnapshot};

/// Committed state of the current route.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteState {
    /// Route path without prefix or language.
    pub current_path: String,
    pub language: Language,
    /// Path of the resolved document.
    pub resolved_document: Option<String>,
    /// Menu paths expanded to reveal the resolved document.
    pub expanded_node_paths: BTreeSet<String>,
    pub breadcrumbs: Vec<BreadcrumbItem>,
}

/// Result of [`ReaderSession::navigate`].
#[derive(Clone, Debug, PartialEq)]
pub enum NavigationOutcome {
    /// The navigation completed and its state was committed.
    Committed(PageView),
    /// A newer navigation started first; nothing was committed.
    Superseded,
}

/// Navigation state for one reader of one section.
pub struct ReaderSession {
    source: Arc<dyn ContentSource>,
    section: Section,
    default_language: Language,
    sequence: AtomicU64,
    snapshot: Mutex<Option<Arc<SiteSnapshot>>>,
    state: Mutex<RouteState>,
    sidebar: Mutex<SidebarState>,
}

impl ReaderSession {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, section: Section) -> Self {
        Self {
            source,
            section,
            default_language: Language::default(),
            sequence: AtomicU64::new(0),
            snapshot: Mutex::new(None),
            state: Mutex::new(RouteState::default()),
            sidebar: Mutex::new(SidebarState::new()),
        }
    }

    /// Language used when neither the location nor a previous navigation
    /// names one.
    #[must_use]
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    #[must_use]
    pub fn section(&self) -> &Section {
        &self.section
    }

    /// Navigate to a browser location (`/docs/zh-cn/guide?x=1#top`).
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the manifest for the target language cannot
    /// be loaded. The previous route state is kept.
    pub async fn navigate(&self, location: &str) -> Result<NavigationOutcome, SiteError> {
        let seq = self.next_sequence();
        let target = self.section.parse_location(location);
        tracing::debug!(seq, %location, path = %target.path, "Navigating");
        self.go(seq, target.language, &target.path).await
    }

    /// Drop the loaded manifest and navigate to the current route again.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the manifest cannot be loaded.
    pub async fn reload(&self) -> Result<NavigationOutcome, SiteError> {
        let seq = self.next_sequence();
        let path = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_path
            .clone();
        let language = self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map_or(self.default_language, |s| s.language());
        tracing::info!(seq, %language, %path, "Reloading manifest");
        self.go(seq, Some(language), &path).await
    }

    async fn go(
        &self,
        seq: u64,
        language: Option<Language>,
        path: &str,
    ) -> Result<NavigationOutcome, SiteError> {
        let current = self.current_snapshot();
        let language = language
            .or_else(|| current.as_ref().map(|s| s.language()))
            .unwrap_or(self.default_language);

        let snapshot = match current {
            Some(snapshot) if snapshot.language() == language => snapshot,
            _ => {
                let loaded =
                    SiteSnapshot::load(Arc::clone(&self.source), &self.section, language).await;
                if !self.is_current(seq) {
                    tracing::debug!(seq, "Discarding superseded manifest load");
                    return Ok(NavigationOutcome::Superseded);
                }
                let loaded = Arc::new(loaded?);
                *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::clone(&loaded));
                loaded
            }
        };

        let page = snapshot.page(path).await;
        if !self.is_current(seq) {
            tracing::debug!(seq, %path, "Discarding superseded navigation");
            return Ok(NavigationOutcome::Superseded);
        }

        self.sidebar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(page.expanded.clone());
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RouteState {
            current_path: page.route_path.clone(),
            language: page.language,
            resolved_document: page.document.as_ref().map(|d| d.path.clone()),
            expanded_node_paths: page.expanded.clone(),
            breadcrumbs: page.breadcrumbs.clone(),
        };

        Ok(NavigationOutcome::Committed(page))
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == seq
    }

    fn current_snapshot(&self) -> Option<Arc<SiteSnapshot>> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last committed route state.
    #[must_use]
    pub fn route_state(&self) -> RouteState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Flip a menu node's expansion. Returns whether it is now expanded.
    ///
    /// Reset by the next navigation.
    pub fn toggle(&self, path: &str) -> bool {
        self.sidebar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .toggle(path)
    }

    /// Currently expanded menu paths, including user toggles.
    #[must_use]
    pub fn expanded(&self) -> BTreeSet<String> {
        self.sidebar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .expanded()
            .clone()
    }

    /// Sidebar for the current state, or `None` before the first navigation.
    #[must_use]
    pub fn navigation(&self) -> Option<Vec<NavItem>> {
        let snapshot = self.current_snapshot()?;
        let current = self.route_state().resolved_document;
        Some(snapshot.navigation(&self.expanded(), current.as_deref()))
    }
}
