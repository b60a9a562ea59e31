//! Navigation API endpoint.
//!
//! Returns the sidebar tree for a section, expanded to reveal the
//! requested page.

use std::sync::Arc;

use asdm_site::{Language, NavItem};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Query parameters for GET /api/{section}/navigation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NavigationQuery {
    /// Language code (default language when absent).
    lang: Option<String>,
    /// Route path of the current page.
    path: Option<String>,
}

/// Response for GET /api/{section}/navigation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NavigationResponse {
    language: Language,
    /// Navigation tree items.
    items: Vec<NavItem>,
    /// Menu paths expanded to reveal the current page.
    expanded: Vec<String>,
    /// Document path of the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<String>,
}

/// Handle GET /api/{section}/navigation.
pub(crate) async fn get_navigation(
    Path(section): Path<String>,
    Query(query): Query<NavigationQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<NavigationResponse>, ServerError> {
    let site = state.site(&section)?;
    let language = state.language(query.lang.as_deref())?;
    let snapshot = site.snapshot(language).await?;

    let current = query.path.as_deref().and_then(|path| snapshot.resolve(path));
    let expanded = current
        .map(|document| snapshot.expanded_for(document))
        .unwrap_or_default();
    let items = snapshot.navigation(&expanded, current.map(|document| document.path.as_str()));

    Ok(Json(NavigationResponse {
        language,
        items,
        expanded: expanded.into_iter().collect(),
        current: current.map(|document| document.path.clone()),
    }))
}
