//! Error types for the HTTP server.

use asdm_site::{LocaleError, SiteError, UnknownLanguage};
use asdm_source::SourceErrorKind;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// No section with this name.
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Route did not resolve to a document.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Unsupported language code.
    #[error(transparent)]
    UnknownLanguage(#[from] UnknownLanguage),

    /// Manifest could not be loaded.
    #[error(transparent)]
    Site(#[from] SiteError),

    /// Translation bundle could not be loaded.
    #[error(transparent)]
    Locale(#[from] LocaleError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SectionNotFound(_) | Self::PageNotFound(_) => StatusCode::NOT_FOUND,
            Self::UnknownLanguage(_) | Self::Locale(LocaleError::InvalidNamespace(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Locale(LocaleError::Source { source, .. })
                if source.kind == SourceErrorKind::NotFound =>
            {
                StatusCode::NOT_FOUND
            }
            Self::Locale(LocaleError::Parse { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Site(_) | Self::Locale(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::SectionNotFound(section) => {
                json!({"error": "Section not found", "section": section})
            }
            Self::PageNotFound(path) => json!({"error": "Page not found", "path": path}),
            Self::Site(e) => {
                tracing::warn!(error = %e, "Manifest unavailable");
                json!({"error": "Manifest unavailable", "message": e.to_string(), "retryable": true})
            }
            e if status == StatusCode::SERVICE_UNAVAILABLE => {
                json!({"error": e.to_string(), "retryable": true})
            }
            e => json!({"error": e.to_string()}),
        };

        (status, axum::Json(body)).into_response()
    }
}
