//! Application state.
//!
//! Shared state for all request handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use asdm_site::{Language, Localizer, Site};
use asdm_source::ContentSource;

use crate::ServerConfig;
use crate::error::ServerError;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Sites keyed by section name.
    pub(crate) sites: BTreeMap<String, Site>,
    /// Translation bundles.
    pub(crate) localizer: Localizer,
    /// Language used when a request names none.
    pub(crate) default_language: Language,
    /// Application version.
    pub(crate) version: String,
}

impl AppState {
    pub(crate) fn new(config: &ServerConfig, source: Arc<dyn ContentSource>) -> Self {
        let sites = config
            .sections
            .iter()
            .map(|section| {
                (
                    section.name.clone(),
                    Site::new(Arc::clone(&source), section.clone()),
                )
            })
            .collect();

        Self {
            sites,
            localizer: Localizer::new(source, config.locale_root.clone()),
            default_language: config.default_language,
            version: config.version.clone(),
        }
    }

    /// Look up a section's site.
    pub(crate) fn site(&self, name: &str) -> Result<&Site, ServerError> {
        self.sites
            .get(name)
            .ok_or_else(|| ServerError::SectionNotFound(name.to_owned()))
    }

    /// Parse a requested language, falling back to the default.
    pub(crate) fn language(&self, requested: Option<&str>) -> Result<Language, ServerError> {
        match requested {
            Some(code) => Ok(code.parse()?),
            None => Ok(self.default_language),
        }
    }
}
