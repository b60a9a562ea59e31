//! Pages API endpoint.
//!
//! Resolves a route and returns document metadata, breadcrumbs, the
//! expanded menu set and the Markdown body.

use std::collections::BTreeMap;
use std::sync::Arc;

use asdm_site::{BreadcrumbItem, ContentStatus, DocumentEntry, Language};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::handlers::to_url_path;
use crate::state::AppState;

/// Query parameters for page requests.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    /// Language code; a language segment in the path takes precedence.
    lang: Option<String>,
}

/// Response for GET /api/{section}/pages/{path}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageResponse {
    language: Language,
    /// Document metadata; absent for a section index view.
    meta: Option<PageMeta>,
    /// Breadcrumb navigation items.
    breadcrumbs: Vec<BreadcrumbResponse>,
    /// Menu paths expanded to reveal the page.
    expanded: Vec<String>,
    /// Markdown body without front matter.
    content: Option<String>,
    content_status: ContentStatus,
}

/// Page metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    title: String,
    name: String,
    /// URL path.
    path: String,
    /// Document path relative to the doc root.
    source_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, String>,
}

impl From<&DocumentEntry> for PageMeta {
    fn from(entry: &DocumentEntry) -> Self {
        Self {
            title: entry.title.clone(),
            name: entry.name.clone(),
            path: to_url_path(entry.route_path()),
            source_path: entry.path.clone(),
            description: entry.effective_description().map(str::to_owned),
            category: entry.effective_category().map(str::to_owned),
            tags: entry.effective_tags().to_vec(),
            author: entry.author.clone(),
            date: entry.date.clone(),
            last_updated: entry.last_updated.clone(),
            read_time: entry.read_time.clone(),
            icon: entry.icon.clone(),
            extra: entry.extra.clone(),
        }
    }
}

/// Breadcrumb item for serialization.
#[derive(Debug, Serialize)]
struct BreadcrumbResponse {
    /// Display title.
    title: String,
    /// Link target path.
    path: String,
}

impl From<BreadcrumbItem> for BreadcrumbResponse {
    fn from(item: BreadcrumbItem) -> Self {
        Self {
            title: item.title,
            path: to_url_path(&item.path),
        }
    }
}

/// Handle GET /api/{section}/pages/ (section home).
pub(crate) async fn get_root_page(
    Path(section): Path<String>,
    Query(query): Query<PageQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageResponse>, ServerError> {
    get_page_impl(&state, &section, "", query.lang.as_deref()).await
}

/// Handle GET /api/{section}/pages/{path}.
pub(crate) async fn get_page(
    Path((section, path)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageResponse>, ServerError> {
    get_page_impl(&state, &section, &path, query.lang.as_deref()).await
}

/// Shared implementation for page requests.
async fn get_page_impl(
    state: &AppState,
    section: &str,
    path: &str,
    lang: Option<&str>,
) -> Result<Json<PageResponse>, ServerError> {
    let site = state.site(section)?;
    // The extractor has already percent-decoded `path`.
    let target = site
        .section()
        .parse_route_path(&format!("{}/{path}", site.section().prefix));
    let language = match target.language {
        Some(language) => language,
        None => state.language(lang)?,
    };

    let snapshot = site.snapshot(language).await?;
    let page = snapshot.page(&target.path).await;

    // An empty route without a document is the section's index view.
    if page.document.is_none() && !page.route_path.is_empty() {
        return Err(ServerError::PageNotFound(page.route_path));
    }

    if let ContentStatus::Unavailable { reason, .. } = &page.content_status {
        tracing::warn!(section, path = %page.route_path, %reason, "Serving page without content");
    }

    Ok(Json(PageResponse {
        language,
        meta: page.document.as_ref().map(PageMeta::from),
        breadcrumbs: page
            .breadcrumbs
            .into_iter()
            .map(BreadcrumbResponse::from)
            .collect(),
        expanded: page.expanded.into_iter().collect(),
        content: page.body,
        content_status: page.content_status,
    }))
}

#[cfg(test)]
mod tests {
    use asdm_source::MockSource;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handlers::test_support;

    #[test]
    fn test_breadcrumb_response_adds_leading_slash() {
        let response = BreadcrumbResponse::from(BreadcrumbItem {
            title: "Home".to_owned(),
            path: String::new(),
        });

        assert_eq!(response.path, "/");
    }

    #[tokio::test]
    async fn test_get_page_with_content() {
        let state = test_support::state(&test_support::docs_source());

        let Json(response) = get_page_impl(&state, "docs", "guide/setup", None)
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["meta"]["title"], "Setup");
        assert_eq!(json["meta"]["path"], "/guide/setup");
        assert_eq!(json["meta"]["sourcePath"], "guide/setup.md");
        assert_eq!(json["meta"]["description"], "Install it");
        assert_eq!(json["content"], "# Setup\n");
        assert_eq!(json["contentStatus"]["status"], "loaded");
        assert_eq!(json["expanded"], serde_json::json!(["guide/_index.md"]));
        assert_eq!(json["breadcrumbs"][1]["path"], "/guide");
    }

    #[tokio::test]
    async fn test_get_page_language_segment_in_path() {
        let state = test_support::state(&test_support::docs_source());

        let Json(response) = get_page_impl(&state, "docs", "en-us/guide/setup", Some("zh-cn"))
            .await
            .unwrap();

        assert_eq!(response.language, Language::EnUs);
        assert_eq!(response.meta.map(|m| m.title), Some("Setup".to_owned()));
    }

    #[tokio::test]
    async fn test_get_page_path_is_not_decoded_twice() {
        let source = Arc::new(MockSource::new().with_text(
            "/docs/en-us/site-tree.yml",
            "documents:\n  - title: Literal\n    path: notes/100%20ready.md\n",
        ));
        let state = test_support::state(&source);

        let Json(response) = get_page_impl(&state, "docs", "notes/100%20ready", None)
            .await
            .unwrap();

        assert_eq!(response.meta.map(|m| m.title), Some("Literal".to_owned()));
        let err = get_page_impl(&state, "docs", "notes/100 ready", None)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_page_directory_named_like_language_alias() {
        let source = Arc::new(MockSource::new().with_text(
            "/docs/en-us/site-tree.yml",
            "documents:\n  - title: Chinese\n    path: zh/intro.md\n",
        ));
        let state = test_support::state(&source);

        let Json(response) = get_page_impl(&state, "docs", "zh/intro", None)
            .await
            .unwrap();

        assert_eq!(response.language, Language::EnUs);
        assert_eq!(response.meta.map(|m| m.title), Some("Chinese".to_owned()));
    }

    #[tokio::test]
    async fn test_get_page_missing_body_is_still_served() {
        let state = test_support::state(&test_support::docs_source());

        let Json(response) = get_page_impl(&state, "docs", "guide", None).await.unwrap();

        assert!(response.content.is_none());
        assert!(matches!(
            response.content_status,
            ContentStatus::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_get_page_not_found() {
        let state = test_support::state(&test_support::docs_source());

        let err = get_page_impl(&state, "docs", "nope", None).await.unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blog_index_view() {
        let source = Arc::new(MockSource::new().with_text(
            "/blogs/content/site-tree.yml",
            "documents:\n  - title: Hello\n    path: hello.md\n",
        ));
        let state = test_support::state(&source);

        let Json(response) = get_page_impl(&state, "blog", "", None).await.unwrap();

        assert!(response.meta.is_none());
        assert_eq!(response.content_status, ContentStatus::NoDocument);
    }
}
