//! Configuration API endpoint.
//!
//! Returns client-side configuration for the frontend.

use std::sync::Arc;

use asdm_site::Language;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /api/config.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigResponse {
    /// Application version.
    version: String,
    /// Language used when a request names none.
    default_language: Language,
    /// Supported languages.
    languages: Vec<Language>,
    /// Served sections.
    sections: Vec<SectionResponse>,
}

/// Section item for JSON response.
#[derive(Serialize)]
struct SectionResponse {
    name: String,
    prefix: String,
}

/// Handle GET /api/config.
pub(crate) async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let sections = state
        .sites
        .values()
        .map(|site| SectionResponse {
            name: site.section().name.clone(),
            prefix: site.section().prefix.clone(),
        })
        .collect();

    Json(ConfigResponse {
        version: state.version.clone(),
        default_language: state.default_language,
        languages: Language::ALL.to_vec(),
        sections,
    })
}

#[cfg(test)]
mod tests {
    use asdm_source::MockSource;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handlers::test_support;

    #[tokio::test]
    async fn test_config_response() {
        let state = test_support::state(&Arc::new(MockSource::new()));

        let Json(response) = get_config(State(state)).await;
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["defaultLanguage"], "en-us");
        assert_eq!(json["languages"], serde_json::json!(["en-us", "zh-cn"]));
        assert_eq!(json["sections"][1]["name"], "docs");
    }
}
