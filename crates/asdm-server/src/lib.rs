//! HTTP API for the ASDM site engine.
//!
//! This crate provides a JSON API over `asdm-site` using axum:
//! - `GET /api/config`: languages and sections
//! - `GET /api/{section}/navigation`: sidebar tree for a language
//! - `GET /api/{section}/pages/{*path}`: resolved page with its Markdown body
//! - `GET /api/i18n/{lang}/{namespace}`: translation bundle
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use asdm_server::{ServerConfig, run_server};
//! use asdm_source::FsSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let source = Arc::new(FsSource::new("public"));
//!     run_server(config, source).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (asdm-server)
//!                        │
//!                        └─► API routes ──► Site (per section, per language)
//!                                               │
//!                                               └─► ContentSource (fs / http)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use asdm_config::{Config, DocumentOrder, EmptyRouteConfig, SectionConfig, SourceLocation};
use asdm_site::{EmptyRoute, Language, RegistryOrder, Section};
use asdm_source::{ContentSource, FsSource, HttpSource};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Language used when a request names none.
    pub default_language: Language,
    /// Location of translation bundles.
    pub locale_root: String,
    /// Content sections served under `/api/{name}/...`.
    pub sections: Vec<Section>,
    /// Application version (reported by `/api/config`).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        server_config_from_asdm_config(&Config::default(), String::new())
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(
    config: ServerConfig,
    source: Arc<dyn ContentSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(source = %source.describe(), sections = config.sections.len(), "Serving content");

    let state = Arc::new(AppState::new(&config, source));
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Build the content source described by the configuration.
#[must_use]
pub fn source_from_config(config: &Config) -> Arc<dyn ContentSource> {
    match &config.source_resolved.location {
        SourceLocation::Dir(dir) => Arc::new(FsSource::new(dir.clone())),
        SourceLocation::Url(url) => {
            Arc::new(HttpSource::with_timeout(url, config.source_resolved.timeout))
        }
    }
}

/// Convert a configured section into a routable [`Section`].
#[must_use]
pub fn section_from_config(name: &str, config: &SectionConfig) -> Section {
    let order = match config.order {
        DocumentOrder::Weighted => RegistryOrder::Weighted,
        DocumentOrder::Source => RegistryOrder::Source,
    };
    let empty_route = match config.empty_route {
        EmptyRouteConfig::FirstDocument => EmptyRoute::FirstDocument,
        EmptyRouteConfig::Index => EmptyRoute::Index,
    };
    Section::new(name, config.prefix.as_str(), config.manifest.as_str())
        .with_order(order)
        .with_empty_route(empty_route)
}

/// Create server configuration from ASDM config.
///
/// # Arguments
///
/// * `config` - ASDM configuration
/// * `version` - Application version
#[must_use]
pub fn server_config_from_asdm_config(config: &Config, version: String) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        default_language: config.i18n.default_language.parse().unwrap_or_default(),
        locale_root: config.i18n.locale_root.clone(),
        sections: config
            .sections
            .iter()
            .map(|(name, section)| section_from_config(name, section))
            .collect(),
        version,
    }
}
