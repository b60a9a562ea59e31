//! Front matter extraction.
//!
//! A document may start with a `---`-delimited YAML block. The block is
//! removed from the body; the keys the site cares about are parsed with
//! `serde_yaml`. Invalid YAML never fails the load: the block is still
//! stripped and an empty [`FrontMatter`] is returned.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Leading `---` line, optional body, closing `---` line (or end of input).
static FRONT_MATTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
        .expect("invalid front matter regex")
});

/// Recognised front matter keys.
///
/// Numeric and boolean scalars are read as text; values of any other shape
/// are ignored per key rather than failing the whole block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_text")]
    pub category: Option<String>,
    /// YAML list or comma-separated string.
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Text of a scalar YAML value.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar_text))
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(scalar_text)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(Value::String(text)) => split_comma_list(&text),
        Some(other) => scalar_text(&other).into_iter().collect(),
        None => Vec::new(),
    };
    Ok(tags)
}

/// Split `a, b,c` into trimmed, non-empty items.
pub(crate) fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split a document into its front matter and body.
///
/// Returns `None` for the front matter when the document has no leading
/// `---` block; the body is then the whole input.
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let Some(captures) = FRONT_MATTER_PATTERN.captures(text) else {
        return (None, text);
    };
    let whole = captures.get(0).map_or(0, |m| m.end());
    let block = captures.get(1).map_or("", |m| m.as_str());

    let front_matter = if block.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(block).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Ignoring invalid front matter");
            FrontMatter::default()
        })
    };

    (Some(front_matter), &text[whole..])
}
