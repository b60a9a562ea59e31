//! `asdm serve` command implementation.

use asdm_config::CliSettings;
use asdm_config::SourceLocation;
use asdm_server::{run_server, server_config_from_asdm_config, source_from_config};
use clap::Args;

use super::ContentArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    content: ContentArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Default language (overrides config).
    #[arg(short, long)]
    lang: Option<String>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.content.load(CliSettings {
            host: self.host,
            port: self.port,
            default_language: self.lang,
            ..CliSettings::default()
        })?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        match &config.source_resolved.location {
            SourceLocation::Dir(dir) => {
                output.info(&format!("Content directory: {}", dir.display()));
            }
            SourceLocation::Url(url) => output.info(&format!("Content URL: {url}")),
        }
        output.info(&format!(
            "Sections: {}",
            config.sections.keys().cloned().collect::<Vec<_>>().join(", ")
        ));
        output.info(&format!(
            "Default language: {}",
            config.i18n.default_language
        ));

        let server_config = server_config_from_asdm_config(&config, version.to_owned());
        run_server(server_config, source_from_config(&config))
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
