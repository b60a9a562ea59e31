//! Site manifest parser.
//!
//! Parses the hand-authored `site-tree.yml` format. This is a line-oriented
//! state machine for the subset of YAML the site's manifests use, not a YAML
//! parser:
//!
//! ```yaml
//! docRoot: /docs/en-us
//! documents:
//!   - title: "Getting Started"
//!     path: "getting-started/_index.md"
//!     tags: [intro, setup]
//!     weight: 1
//! menu-tree:
//!   - path: getting-started/_index.md
//!     menu-title: Start here
//!     children:
//!       - path: getting-started/install.md
//!         menu-title: Install
//! ```
//!
//! Menu nodes are keyed on literal indentation: a node marker `- path:` sits
//! at `2 + 4d` spaces and its `menu-title:` / `children:` at `4 + 4d` for
//! depth `d`.
//!
//! The parser never fails. Lines it cannot place are skipped and reported as
//! [`Diagnostic`]s.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::front_matter::split_comma_list;
use crate::menu::MenuNode;
use crate::registry::DocumentEntry;

/// Non-fatal problem found while parsing or validating a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number, when the problem is tied to a line.
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }

    fn global(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Parsed site manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteManifest {
    /// Base location for document bodies (empty when not declared).
    pub doc_root: String,
    /// Documents in source order.
    pub documents: Vec<DocumentEntry>,
    /// Menu forest; `None` when the section is missing or has no node.
    pub menu_tree: Option<Vec<MenuNode>>,
    /// Other top-level scalars.
    pub extra: BTreeMap<String, String>,
}

impl SiteManifest {
    /// Parse manifest text, discarding diagnostics.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::parse_with_diagnostics(text).0
    }

    /// Parse manifest text and report skipped lines and dropped records.
    #[must_use]
    pub fn parse_with_diagnostics(text: &str) -> (Self, Vec<Diagnostic>) {
        let mut parser = Parser::default();
        for (idx, line) in text.lines().enumerate() {
            parser.feed(idx + 1, line);
        }
        parser.finish()
    }

    /// Check invariants the parser does not enforce.
    ///
    /// Reports duplicate document paths, menu nodes that appear more than
    /// once, and menu nodes without a matching document.
    #[must_use]
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let mut paths = HashSet::new();
        for doc in &self.documents {
            if !paths.insert(doc.path.as_str()) {
                diagnostics.push(Diagnostic::global(format!(
                    "duplicate document path: {}",
                    doc.path
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut stack: Vec<&MenuNode> = self.menu_tree.iter().flatten().rev().collect();
        while let Some(node) = stack.pop() {
            if !seen.insert(node.path.as_str()) {
                diagnostics.push(Diagnostic::global(format!(
                    "menu node appears more than once: {}",
                    node.path
                )));
            }
            if !paths.contains(node.path.as_str()) {
                diagnostics.push(Diagnostic::global(format!(
                    "menu node has no document: {}",
                    node.path
                )));
            }
            stack.extend(node.children.iter().rev());
        }

        diagnostics
    }
}

/// Parser state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    TopLevel,
    Documents,
    MenuTree,
}

/// Value of a `key: value` line.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            Some(inner) => Value::List(
                inner
                    .split(',')
                    .map(|item| unquote(item.trim()).to_owned())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            None => Value::Text(unquote(raw).to_owned()),
        }
    }

    fn into_text(self) -> String {
        match self {
            Value::Text(text) => text,
            Value::List(items) => items.join(", "),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            Value::Text(text) => split_comma_list(&text),
            Value::List(items) => items,
        }
    }
}

/// Strip one pair of matching quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// A line, classified once.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Blank or `#` comment.
    Skip,
    /// Column-0 `key:` with no value.
    Section(&'a str),
    /// Column-0 `key: value`.
    Scalar(&'a str, &'a str),
    /// `- key: value` at the given indentation.
    Item(usize, &'a str, &'a str),
    /// Indented `key: value` (value may be empty).
    Property(usize, &'a str, &'a str),
    /// Anything else.
    Unknown,
}

fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim_end();
    let body = line.trim_start_matches(' ');
    if body.is_empty() || body.starts_with('#') {
        return Line::Skip;
    }
    let indent = line.len() - body.len();

    if let Some(rest) = body.strip_prefix("- ") {
        return match split_key_value(rest) {
            Some((key, value)) => Line::Item(indent, key, value),
            None => Line::Unknown,
        };
    }

    match split_key_value(body) {
        Some((key, "")) if indent == 0 => Line::Section(key),
        Some((key, value)) if indent == 0 => Line::Scalar(key, value),
        Some((key, value)) => Line::Property(indent, key, value),
        None => Line::Unknown,
    }
}

/// Document record being collected.
struct PendingDocument {
    line: usize,
    fields: Vec<(String, Value)>,
}

/// Menu node being collected, with whether it opened a `children:` block.
struct PendingNode {
    node: MenuNode,
    children_open: bool,
}

/// Indentation of a node marker at `depth`.
fn marker_indent(depth: usize) -> usize {
    2 + 4 * depth
}

/// Indentation of a node property at `depth`.
fn property_indent(depth: usize) -> usize {
    4 + 4 * depth
}

struct Parser {
    state: State,
    manifest: SiteManifest,
    diagnostics: Vec<Diagnostic>,
    document: Option<PendingDocument>,
    roots: Vec<MenuNode>,
    /// Open menu nodes; index equals depth.
    stack: Vec<PendingNode>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            state: State::TopLevel,
            manifest: SiteManifest::default(),
            diagnostics: Vec::new(),
            document: None,
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }
}

impl Parser {
    fn feed(&mut self, line_no: usize, line: &str) {
        match (self.state, classify(line)) {
            (_, Line::Skip) => {}
            (_, Line::Section(key)) => {
                self.flush();
                self.state = match key {
                    "documents" => State::Documents,
                    "menu-tree" => State::MenuTree,
                    _ => {
                        self.skip(line_no, format!("unknown section `{key}`"));
                        State::TopLevel
                    }
                };
            }
            (_, Line::Scalar(key, value)) => {
                self.flush();
                self.state = State::TopLevel;
                let value = Value::parse(value).into_text();
                if key == "docRoot" {
                    self.manifest.doc_root = value;
                } else {
                    self.manifest.extra.insert(key.to_owned(), value);
                }
            }
            (State::Documents, Line::Item(_, key, value)) => {
                self.flush_document();
                self.document = Some(PendingDocument {
                    line: line_no,
                    fields: vec![(key.to_owned(), Value::parse(value))],
                });
            }
            (State::Documents, Line::Property(_, key, value)) => match &mut self.document {
                Some(doc) => doc.fields.push((key.to_owned(), Value::parse(value))),
                None => self.skip(line_no, "document property outside a record"),
            },
            (State::MenuTree, Line::Item(indent, "path", value)) => {
                self.menu_marker(line_no, indent, value);
            }
            (State::MenuTree, Line::Property(indent, key, value)) => {
                self.menu_property(line_no, indent, key, value);
            }
            _ => self.skip(line_no, "unrecognised line"),
        }
    }

    fn skip(&mut self, line_no: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at(line_no, message));
    }

    fn menu_marker(&mut self, line_no: usize, indent: usize, value: &str) {
        let Some(depth) = (indent >= 2 && (indent - 2) % 4 == 0).then(|| (indent - 2) / 4) else {
            self.skip(line_no, "menu node at unexpected indentation");
            return;
        };
        let parent_open = depth == 0
            || self
                .stack
                .get(depth - 1)
                .is_some_and(|parent| parent.children_open);
        if !parent_open {
            self.skip(line_no, "menu node outside a children block");
            return;
        }

        self.close_menu_to(depth);
        self.stack.push(PendingNode {
            node: MenuNode::new(unquote(value.trim())),
            children_open: false,
        });
    }

    fn menu_property(&mut self, line_no: usize, indent: usize, key: &str, value: &str) {
        let depth = self.stack.len().checked_sub(1);
        let Some(current) = depth
            .filter(|&d| property_indent(d) == indent)
            .and_then(|_| self.stack.last_mut())
        else {
            self.skip(line_no, "menu property outside a node");
            return;
        };

        match (key, value) {
            ("menu-title", value) => {
                current.node.menu_title = Some(Value::parse(value).into_text());
            }
            ("children", "") => current.children_open = true,
            _ => self.skip(line_no, format!("unknown menu property `{key}`")),
        }
    }

    /// Close open menu nodes until `depth` nodes remain.
    fn close_menu_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            let Some(done) = self.stack.pop() else { break };
            match self.stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => self.roots.push(done.node),
            }
        }
    }

    fn flush_document(&mut self) {
        let Some(pending) = self.document.take() else {
            return;
        };
        if let Some(entry) = self.build_document(pending) {
            self.manifest.documents.push(entry);
        }
    }

    fn build_document(&mut self, pending: PendingDocument) -> Option<DocumentEntry> {
        let path = pending.fields.iter().find_map(|(key, value)| match value {
            Value::Text(text) if key == "path" && !text.is_empty() => Some(text.clone()),
            _ => None,
        });
        let Some(path) = path else {
            self.skip(pending.line, "document without path dropped");
            return None;
        };

        let mut entry = DocumentEntry::new(path);
        for (key, value) in pending.fields {
            match key.as_str() {
                "path" => {}
                "title" => entry.title = value.into_text(),
                "description" => entry.description = Some(value.into_text()),
                "category" => entry.category = Some(value.into_text()),
                "tags" => entry.tags = value.into_list(),
                "author" => entry.author = Some(value.into_text()),
                "date" => entry.date = Some(value.into_text()),
                "lastUpdated" => entry.last_updated = Some(value.into_text()),
                "created" => entry.created = Some(value.into_text()),
                "updated" => entry.updated = Some(value.into_text()),
                "readTime" => entry.read_time = Some(value.into_text()),
                "icon" => entry.icon = Some(value.into_text()),
                "weight" => {
                    let text = value.into_text();
                    match text.parse::<f64>() {
                        Ok(weight) if weight.is_finite() => entry.weight = Some(weight),
                        _ => self.skip(
                            pending.line,
                            format!("invalid weight `{text}` for {}", entry.path),
                        ),
                    }
                }
                _ => {
                    entry.extra.insert(key, value.into_text());
                }
            }
        }
        if entry.title.is_empty() {
            entry.title.clone_from(&entry.name);
        }
        Some(entry)
    }

    fn flush(&mut self) {
        self.flush_document();
        self.close_menu_to(0);
    }

    fn finish(mut self) -> (SiteManifest, Vec<Diagnostic>) {
        self.flush();
        if !self.roots.is_empty() {
            self.manifest.menu_tree = Some(self.roots);
        }
        (self.manifest, self.diagnostics)
    }
}
