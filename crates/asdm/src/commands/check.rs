//! `asdm check` command implementation.

use std::collections::BTreeSet;
use std::sync::Arc;

use asdm_config::CliSettings;
use asdm_server::source_from_config;
use asdm_site::{Language, Section, SiteError, SiteManifest, SiteSnapshot};
use asdm_source::ContentSource;
use clap::Args;

use super::{ContentArgs, section};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Section name (e.g. `docs`).
    section: String,

    /// Check one language only (default: all languages).
    #[arg(short, long)]
    lang: Option<String>,

    /// Also read every document body.
    #[arg(long)]
    bodies: bool,

    #[command(flatten)]
    content: ContentArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest cannot be loaded or any problem is found.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.content.load(CliSettings::default())?;
        let section = section(&config, &self.section)?;
        let languages = match &self.lang {
            Some(code) => vec![code.parse()?],
            None => Language::ALL.to_vec(),
        };

        let problems = check_section(
            &output,
            source_from_config(&config),
            &section,
            &languages,
            self.bodies,
        )
        .await?;

        if problems > 0 {
            return Err(CliError::Validation(format!("{problems} problem(s) found")));
        }
        output.success("No problems found");
        Ok(())
    }
}

/// Check each distinct manifest of `section` and return the problem count.
///
/// Languages sharing a manifest location are checked once.
async fn check_section(
    output: &Output,
    source: Arc<dyn ContentSource>,
    section: &Section,
    languages: &[Language],
    bodies: bool,
) -> Result<usize, CliError> {
    let mut seen = BTreeSet::new();
    let mut problems = 0;

    for &language in languages {
        let location = section.manifest_location(language);
        if !seen.insert(location.clone()) {
            continue;
        }
        output.highlight(&format!("{} ({language}): {location}", section.name));

        let text = read_manifest(Arc::clone(&source), &location, language).await?;
        let (manifest, mut diagnostics) = SiteManifest::parse_with_diagnostics(&text);
        diagnostics.extend(manifest.validate());
        for diagnostic in &diagnostics {
            output.warning(&format!("  {diagnostic}"));
        }
        problems += diagnostics.len();

        let snapshot = SiteSnapshot::from_manifest(
            Arc::clone(&source),
            section,
            language,
            location,
            manifest,
            diagnostics,
        );
        output.info(&format!(
            "  {} documents, menu tree: {}",
            snapshot.registry().len(),
            if snapshot.menu_tree().is_some() { "yes" } else { "no" }
        ));

        if bodies {
            for entry in snapshot.registry().entries() {
                if let Err(e) = snapshot.load_content(entry).await {
                    output.warning(&format!("  {e}"));
                    problems += 1;
                }
            }
        }
    }

    Ok(problems)
}

async fn read_manifest(
    source: Arc<dyn ContentSource>,
    location: &str,
    language: Language,
) -> Result<String, CliError> {
    let read_location = location.to_owned();
    let read = tokio::task::spawn_blocking(move || source.read(&read_location))
        .await
        .map_err(std::io::Error::other)?;
    read.map_err(|e| {
        CliError::Site(SiteError::ManifestUnavailable {
            location: location.to_owned(),
            language,
            source: Arc::new(e),
        })
    })
}

#[cfg(test)]
mod tests {
    use asdm_source::MockSource;
    use pretty_assertions::assert_eq;

    use super::*;

    const MANIFEST: &str = "\
documents:
  - title: A
    path: a.md
  - title: A again
    path: a.md
  - title: B
    path: b.md
menu-tree:
  - path: ghost.md
";

    fn docs() -> Section {
        Section::new("docs", "docs", "/docs/{lang}/site-tree.yml")
    }

    #[tokio::test]
    async fn test_check_counts_manifest_problems() {
        let source = Arc::new(MockSource::new().with_text("/docs/en-us/site-tree.yml", MANIFEST));

        let problems = check_section(&Output::new(), source, &docs(), &[Language::EnUs], false)
            .await
            .unwrap();

        assert_eq!(problems, 2);
    }

    #[tokio::test]
    async fn test_check_bodies() {
        let source = Arc::new(
            MockSource::new()
                .with_text("/docs/en-us/site-tree.yml", "documents:\n  - path: a.md\n  - path: b.md\n")
                .with_text("/docs/en-us/a.md", "# A"),
        );

        let problems = check_section(&Output::new(), source, &docs(), &[Language::EnUs], true)
            .await
            .unwrap();

        assert_eq!(problems, 1);
    }

    #[tokio::test]
    async fn test_check_shared_manifest_once() {
        let source = Arc::new(
            MockSource::new().with_text("/blogs/content/site-tree.yml", "documents:\n  - path: a.md\n"),
        );
        let blog = Section::new("blog", "blog", "/blogs/content/site-tree.yml");

        let problems = check_section(
            &Output::new(),
            Arc::clone(&source) as Arc<dyn ContentSource>,
            &blog,
            &Language::ALL,
            false,
        )
        .await
        .unwrap();

        assert_eq!(problems, 0);
        assert_eq!(source.read_count("/blogs/content/site-tree.yml"), 1);
    }

    #[tokio::test]
    async fn test_check_missing_manifest() {
        let result = check_section(
            &Output::new(),
            Arc::new(MockSource::new()),
            &docs(),
            &[Language::ZhCn],
            false,
        )
        .await;

        assert!(matches!(result, Err(CliError::Site(_))));
    }
}
