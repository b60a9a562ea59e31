//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/config", get(handlers::config::get_config))
        .route(
            "/api/i18n/{lang}/{namespace}",
            get(handlers::i18n::get_bundle),
        )
        .route(
            "/api/{section}/navigation",
            get(handlers::navigation::get_navigation),
        )
        .route("/api/{section}/pages/", get(handlers::pages::get_root_page))
        .route("/api/{section}/pages/{*path}", get(handlers::pages::get_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::cache_control_layer()),
        )
        .with_state(state)
}
