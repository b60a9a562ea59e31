//! `asdm nav` command implementation.

use asdm_config::CliSettings;
use asdm_server::source_from_config;
use asdm_site::{NavItem, Site};
use clap::Args;

use super::{ContentArgs, language, section};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the nav command.
#[derive(Args)]
pub(crate) struct NavArgs {
    /// Section name (e.g. `docs`).
    section: String,

    /// Language code (default: configured default language).
    #[arg(short, long)]
    lang: Option<String>,

    /// Route path of the current page; its ancestors are expanded.
    #[arg(short, long)]
    path: Option<String>,

    /// Show collapsed subtrees too.
    #[arg(short, long)]
    all: bool,

    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    content: ContentArgs,
}

impl NavArgs {
    /// Execute the nav command.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is unknown or its manifest cannot be
    /// loaded.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load(CliSettings::default())?;
        let section = section(&config, &self.section)?;
        let language = language(&config, self.lang.as_deref())?;

        let site = Site::new(source_from_config(&config), section);
        let snapshot = site.snapshot(language).await?;

        let current = self
            .path
            .as_deref()
            .and_then(|path| snapshot.resolve(path));
        let expanded = current
            .map(|document| snapshot.expanded_for(document))
            .unwrap_or_default();
        let items = snapshot.navigation(&expanded, current.map(|document| document.path.as_str()));

        if self.json {
            output.result(&serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        output.highlight(&format!(
            "{} ({language}): {} documents",
            snapshot.section().name,
            snapshot.registry().len()
        ));
        let mut lines = Vec::new();
        render_tree(&items, 0, self.all, &mut lines);
        for line in &lines {
            output.result(line);
        }
        if let Some(path) = &self.path
            && current.is_none()
        {
            output.warning(&format!("No document for route {path:?}"));
        }
        Ok(())
    }
}

/// Render sidebar items as indented lines.
///
/// `▾` marks an expanded parent, `▸` a collapsed one and `*` the current
/// document. Collapsed subtrees are skipped unless `all` is set.
fn render_tree(items: &[NavItem], depth: usize, all: bool, lines: &mut Vec<String>) {
    for item in items {
        let marker = match (item.children.is_empty(), item.expanded) {
            (true, _) => ' ',
            (false, true) => '▾',
            (false, false) => '▸',
        };
        let current = if item.current { " *" } else { "" };
        lines.push(format!(
            "{}{marker} {} /{}{current}",
            "  ".repeat(depth),
            item.label,
            item.route
        ));
        if item.expanded || all {
            render_tree(&item.children, depth + 1, all, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(label: &str, route: &str, children: Vec<NavItem>) -> NavItem {
        NavItem {
            label: label.to_owned(),
            path: format!("{route}.md"),
            route: route.to_owned(),
            expanded: false,
            current: false,
            children,
        }
    }

    #[test]
    fn test_render_tree_collapsed() {
        let items = vec![item("Guide", "guide", vec![item("Setup", "guide/setup", vec![])])];

        let mut lines = Vec::new();
        render_tree(&items, 0, false, &mut lines);

        assert_eq!(lines, vec!["▸ Guide /guide"]);
    }

    #[test]
    fn test_render_tree_expanded_with_current() {
        let mut setup = item("Setup", "guide/setup", vec![]);
        setup.current = true;
        let mut guide = item("Guide", "guide", vec![setup]);
        guide.expanded = true;

        let mut lines = Vec::new();
        render_tree(&[guide], 0, false, &mut lines);

        assert_eq!(
            lines,
            vec!["▾ Guide /guide", "    Setup /guide/setup *"]
        );
    }

    #[test]
    fn test_render_tree_all() {
        let items = vec![item("Guide", "guide", vec![item("Setup", "guide/setup", vec![])])];

        let mut lines = Vec::new();
        render_tree(&items, 0, true, &mut lines);

        assert_eq!(lines.len(), 2);
    }
}
