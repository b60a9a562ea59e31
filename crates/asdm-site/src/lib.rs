//! Site structure, routing and content loading for ASDM.
//!
//! This crate provides:
//! - [`SiteManifest`]: line-oriented parser for `site-tree.yml` manifests
//! - [`Registry`]: ordered, indexed document entries
//! - [`ContentLoader`]: lazy, de-duplicated body loading
//! - [`Section`]: route parsing and resolution
//! - [`expand_to_reveal`], [`navigation`], [`breadcrumbs`]: sidebar state
//! - [`Site`] and [`ReaderSession`]: per-language snapshots and navigation
//! - [`Localizer`]: translation bundles
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> Result<(), asdm_site::SiteError> {
//! use std::sync::Arc;
//! use asdm_site::{Language, Section, Site};
//! use asdm_source::FsSource;
//!
//! let source = Arc::new(FsSource::new("public"));
//! let section = Section::new("docs", "docs", "/docs/{lang}/site-tree.yml");
//! let site = Site::new(source, section);
//!
//! let snapshot = site.snapshot(Language::EnUs).await?;
//! let page = snapshot.page("guide/setup").await;
//! println!("{:?}", page.document.map(|d| d.title));
//! # Ok(())
//! # }
//! ```

mod front_matter;
mod loader;
mod locale;
mod manifest;
mod menu;
mod registry;
mod route;
mod session;
mod site;

pub use front_matter::{FrontMatter, split_front_matter};
pub use loader::{ContentLoader, LoadError};
pub use locale::{LocaleError, Localizer};
pub use manifest::{Diagnostic, SiteManifest};
pub use menu::{
    BreadcrumbItem, MenuNode, NavItem, SidebarState, breadcrumbs, expand_to_reveal,
    first_document, navigation,
};
pub use registry::{DocumentEntry, Registry, RegistryOrder};
pub use route::{
    EmptyRoute, Language, RouteTarget, Section, UnknownLanguage, canonical_route_path,
};
pub use session::{NavigationOutcome, ReaderSession, RouteState};
pub use site::{ContentStatus, PageView, Site, SiteError, SiteSnapshot};
