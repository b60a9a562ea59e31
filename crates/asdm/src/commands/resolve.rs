//! `asdm resolve` command implementation.

use std::sync::Arc;

use asdm_config::CliSettings;
use asdm_server::source_from_config;
use asdm_site::{
    ContentStatus, Language, NavigationOutcome, PageView, ReaderSession, RouteState, Section,
};
use asdm_source::ContentSource;
use clap::Args;

use super::{ContentArgs, language, section};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Location to resolve (e.g. `/docs/zh-cn/guide/setup`).
    location: String,

    /// Section the location belongs to.
    #[arg(short, long, default_value = "docs")]
    section: String,

    /// Print the committed route state as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    content: ContentArgs,
}

impl ResolveArgs {
    /// Execute the resolve command.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be loaded or no document
    /// matches the location.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load(CliSettings::default())?;
        let section = section(&config, &self.section)?;
        let default_language = language(&config, None)?;

        let (page, state) = resolve_location(
            source_from_config(&config),
            section,
            default_language,
            &self.location,
        )
        .await?;

        if self.json {
            output.result(&serde_json::to_string_pretty(&state)?);
        } else {
            print_page(&output, &page, &state);
        }

        if page.document.is_none() && !page.route_path.is_empty() {
            return Err(CliError::Validation(format!(
                "no document matches {}",
                self.location
            )));
        }
        Ok(())
    }
}

/// Navigate a fresh reader session to `location`.
async fn resolve_location(
    source: Arc<dyn ContentSource>,
    section: Section,
    default_language: Language,
    location: &str,
) -> Result<(PageView, RouteState), CliError> {
    let session = ReaderSession::new(source, section).with_default_language(default_language);
    match session.navigate(location).await? {
        NavigationOutcome::Committed(page) => Ok((page, session.route_state())),
        NavigationOutcome::Superseded => Err(CliError::Validation(format!(
            "navigation to {location} was superseded"
        ))),
    }
}

fn print_page(output: &Output, page: &PageView, state: &RouteState) {
    let Some(document) = &page.document else {
        if page.route_path.is_empty() {
            output.highlight("Section index");
        } else {
            output.warning(&format!("No document for route {:?}", page.route_path));
        }
        return;
    };

    output.highlight(&document.title);
    output.result(&format!("Document:    {}", document.path));
    output.result(&format!("Route:       {}", document.route_path()));
    output.result(&format!("Language:    {}", state.language));
    output.result(&format!("Breadcrumbs: {}", breadcrumb_trail(state)));
    if !state.expanded_node_paths.is_empty() {
        output.result(&format!(
            "Expanded:    {}",
            state
                .expanded_node_paths
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    match &page.content_status {
        ContentStatus::Loaded => {
            let lines = page.body.as_deref().map_or(0, |body| body.lines().count());
            output.success(&format!("Content loaded ({lines} lines)"));
        }
        ContentStatus::Unavailable { reason, .. } => {
            output.warning(&format!("Content unavailable: {reason}"));
        }
        ContentStatus::NoDocument => {}
    }
}

fn breadcrumb_trail(state: &RouteState) -> String {
    state
        .breadcrumbs
        .iter()
        .map(|item| item.title.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}
