//! Translation bundle endpoint.

use std::sync::Arc;

use asdm_site::Language;
use axum::Json;
use axum::extract::{Path, State};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/i18n/{lang}/{namespace}.
///
/// A trailing `.json` on the namespace is ignored.
pub(crate) async fn get_bundle(
    Path((lang, namespace)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let language: Language = lang.parse()?;
    let namespace = namespace.strip_suffix(".json").unwrap_or(&namespace);
    let bundle = state.localizer.load(language, namespace).await?;
    Ok(Json(bundle.as_ref().clone()))
}
