//! Menu tree, sidebar expansion and breadcrumbs.
//!
//! The menu forest comes from the manifest's `menu-tree` section. Node paths
//! refer to document paths; nodes whose document is missing are skipped
//! together with their subtree.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::registry::{DocumentEntry, Registry};

/// Node of the menu forest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    /// Document path.
    pub path: String,
    /// Label override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            menu_title: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.menu_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }
}

/// Chain of nodes from a root down to the first node matching `target`
/// (depth-first, pre-order). The target node is the last element.
fn find_chain<'a>(forest: &'a [MenuNode], target: &str) -> Option<Vec<&'a MenuNode>> {
    for node in forest {
        if node.path == target {
            return Some(vec![node]);
        }
        if let Some(mut chain) = find_chain(&node.children, target) {
            chain.insert(0, node);
            return Some(chain);
        }
    }
    None
}

/// Menu paths that must be expanded for `target` to be visible.
///
/// Returns the ancestors of the first node whose path equals `target`, never
/// the target itself. Empty when no node matches.
#[must_use]
pub fn expand_to_reveal(forest: &[MenuNode], target: &str) -> BTreeSet<String> {
    let Some(mut chain) = find_chain(forest, target) else {
        return BTreeSet::new();
    };
    chain.pop();
    chain.into_iter().map(|node| node.path.clone()).collect()
}

/// First document referenced by the forest.
///
/// Nodes without a matching document are skipped along with their subtree,
/// so this is the first root that has a document.
#[must_use]
pub fn first_document<'a>(forest: &[MenuNode], registry: &'a Registry) -> Option<&'a DocumentEntry> {
    forest.iter().find_map(|node| registry.get(&node.path))
}

/// Sidebar expansion state for one reader.
///
/// Navigation replaces the set with the ancestors of the new target; the
/// reader may then toggle nodes until the next navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SidebarState {
    expanded: BTreeSet<String>,
}

impl SidebarState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the expanded set so `target` is visible.
    pub fn reveal(&mut self, forest: &[MenuNode], target: &str) {
        self.expanded = expand_to_reveal(forest, target);
    }

    /// Replace the expanded set.
    pub fn set(&mut self, expanded: BTreeSet<String>) {
        self.expanded = expanded;
    }

    /// Flip one node. Returns whether it is expanded afterwards.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_owned());
            true
        }
    }

    #[must_use]
    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    #[must_use]
    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }
}

/// Sidebar item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    /// Display label (menu title or document title).
    pub label: String,
    /// Document path.
    pub path: String,
    /// Route path of the document.
    pub route: String,
    /// Whether the item's children are shown.
    pub expanded: bool,
    /// Whether this is the current document.
    pub current: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

fn nav_item(
    label: &str,
    entry: &DocumentEntry,
    expanded: &BTreeSet<String>,
    current: Option<&str>,
    children: Vec<NavItem>,
) -> NavItem {
    NavItem {
        label: label.to_owned(),
        path: entry.path.clone(),
        route: entry.route_path().to_owned(),
        expanded: !children.is_empty() && expanded.contains(&entry.path),
        current: current == Some(entry.path.as_str()),
        children,
    }
}

fn menu_items(
    forest: &[MenuNode],
    registry: &Registry,
    expanded: &BTreeSet<String>,
    current: Option<&str>,
) -> Vec<NavItem> {
    forest
        .iter()
        .filter_map(|node| {
            let entry = registry.get(&node.path)?;
            let children = menu_items(&node.children, registry, expanded, current);
            let label = node.menu_title.as_deref().unwrap_or(&entry.title);
            Some(nav_item(label, entry, expanded, current, children))
        })
        .collect()
}

/// Build the sidebar.
///
/// Uses the menu tree when present, otherwise a flat list of all entries in
/// registry order. `current` is the path of the current document.
#[must_use]
pub fn navigation(
    registry: &Registry,
    menu_tree: Option<&[MenuNode]>,
    expanded: &BTreeSet<String>,
    current: Option<&str>,
) -> Vec<NavItem> {
    match menu_tree {
        Some(forest) => menu_items(forest, registry, expanded, current),
        None => registry
            .entries()
            .iter()
            .map(|entry| nav_item(&entry.title, entry, expanded, current, Vec::new()))
            .collect(),
    }
}

/// Breadcrumb item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    /// Display title.
    pub title: String,
    /// Route path (empty for the section home).
    pub path: String,
}

/// Build breadcrumbs for `current`.
///
/// Starts with "Home". Ancestors come from the menu tree when `current` is
/// in it; otherwise from directory prefixes of its route path that resolve to
/// documents. The current document is not included.
#[must_use]
pub fn breadcrumbs(
    registry: &Registry,
    menu_tree: Option<&[MenuNode]>,
    current: &DocumentEntry,
) -> Vec<BreadcrumbItem> {
    let mut items = vec![BreadcrumbItem {
        title: "Home".to_owned(),
        path: String::new(),
    }];

    if let Some(mut chain) = menu_tree.and_then(|forest| find_chain(forest, &current.path)) {
        chain.pop();
        items.extend(chain.into_iter().filter_map(|node| {
            let entry = registry.get(&node.path)?;
            Some(BreadcrumbItem {
                title: node.menu_title.clone().unwrap_or_else(|| entry.title.clone()),
                path: entry.route_path().to_owned(),
            })
        }));
        return items;
    }

    let route = current.route_path();
    let mut prefix_end = 0;
    while let Some(pos) = route[prefix_end..].find('/') {
        let prefix = &route[..prefix_end + pos];
        prefix_end += pos + 1;
        let entry = registry
            .by_route(prefix)
            .or_else(|| registry.get(&format!("{prefix}/_index.md")));
        if let Some(entry) = entry {
            items.push(BreadcrumbItem {
                title: entry.title.clone(),
                path: entry.route_path().to_owned(),
            });
        }
    }

    items
}
