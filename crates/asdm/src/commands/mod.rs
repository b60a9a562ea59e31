//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod nav;
pub(crate) mod resolve;
pub(crate) mod serve;

use std::path::PathBuf;

use asdm_config::{CliSettings, Config};
use asdm_server::section_from_config;
use asdm_site::{Language, Section};
use clap::Args;

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use nav::NavArgs;
pub(crate) use resolve::ResolveArgs;
pub(crate) use serve::ServeArgs;

/// Options shared by commands that read site content.
#[derive(Args)]
pub(crate) struct ContentArgs {
    /// Path to configuration file (default: auto-discover asdm.toml).
    #[arg(short, long, env = "ASDM_CONFIG")]
    config: Option<PathBuf>,

    /// Content directory mirroring the web root (overrides config).
    #[arg(long, conflicts_with = "source_url")]
    source_dir: Option<PathBuf>,

    /// Base URL to fetch content from (overrides config).
    #[arg(long)]
    source_url: Option<String>,
}

impl ContentArgs {
    /// Load configuration with content overrides applied on top of `settings`.
    pub(crate) fn load(self, settings: CliSettings) -> Result<Config, CliError> {
        let settings = CliSettings {
            source_dir: self.source_dir,
            source_url: self.source_url,
            ..settings
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// Look up a configured section by name.
pub(crate) fn section(config: &Config, name: &str) -> Result<Section, CliError> {
    Ok(section_from_config(name, config.section(name)?))
}

/// Requested language, or the configured default.
pub(crate) fn language(config: &Config, requested: Option<&str>) -> Result<Language, CliError> {
    let code = requested.unwrap_or(&config.i18n.default_language);
    Ok(code.parse()?)
}
