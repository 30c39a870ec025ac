//! Document tree types produced by the converter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which formatting rules the converter applies.
///
/// `Solution` additionally recognises the `Question` / `Approach` /
/// `Solution` / `Answer` section labels and skips blank lines; `Notes`
/// treats every line with the shared block rules only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Study notes generated from a syllabus (default).
    #[default]
    Notes,
    /// Worked solutions for a question paper.
    Solution,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Notes => f.write_str("notes"),
            Mode::Solution => f.write_str("solution"),
        }
    }
}

/// The two kinds of highlighted box used in solution documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutKind {
    Approach,
    Answer,
}

impl CalloutKind {
    /// Title shown at the top of the box.
    pub fn label(self) -> &'static str {
        match self {
            CalloutKind::Approach => "Approach",
            CalloutKind::Answer => "Answer",
        }
    }

    /// CSS class of the wrapping `div` in HTML output.
    pub fn css_class(self) -> &'static str {
        match self {
            CalloutKind::Approach => "approach",
            CalloutKind::Answer => "answer",
        }
    }
}

/// One row of a pipe-delimited table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    /// The first row of every table is its header row.
    pub is_header: bool,
}

/// A single block-level element of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentNode {
    /// Section heading. `level` is always 2 or 3.
    Heading { level: u8, text: String },
    Paragraph { text: String },
    List { ordered: bool, items: Vec<String> },
    BlockQuote { text: String },
    Table { rows: Vec<TableRow> },
    /// Highlighted box. `text` is the remainder of the label line, `body`
    /// holds any following lines that belong to the same section.
    Callout {
        kind: CalloutKind,
        text: String,
        body: Vec<String>,
    },
}

impl DocumentNode {
    pub(crate) fn heading(level: u8, text: &str) -> Self {
        DocumentNode::Heading {
            level,
            text: strip_emphasis(text),
        }
    }

    pub(crate) fn paragraph(text: &str) -> Self {
        DocumentNode::Paragraph {
            text: strip_emphasis(text),
        }
    }

    pub(crate) fn block_quote(text: &str) -> Self {
        DocumentNode::BlockQuote {
            text: strip_emphasis(text),
        }
    }

    pub(crate) fn callout(kind: CalloutKind, text: &str) -> Self {
        DocumentNode::Callout {
            kind,
            text: strip_emphasis(text),
            body: Vec::new(),
        }
    }

    /// Every text value carried by this node, in document order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            DocumentNode::Heading { text, .. }
            | DocumentNode::Paragraph { text }
            | DocumentNode::BlockQuote { text } => vec![text.as_str()],
            DocumentNode::List { items, .. } => items.iter().map(String::as_str).collect(),
            DocumentNode::Table { rows } => rows
                .iter()
                .flat_map(|row| row.cells.iter().map(String::as_str))
                .collect(),
            DocumentNode::Callout { text, body, .. } => std::iter::once(text.as_str())
                .chain(body.iter().map(String::as_str))
                .collect(),
        }
    }
}

/// The ordered output of one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    pub mode: Mode,
    pub nodes: Vec<DocumentNode>,
}

impl DocumentTree {
    pub fn new(mode: Mode, nodes: Vec<DocumentNode>) -> Self {
        Self { mode, nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// All text values in the tree, flattened in document order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().flat_map(DocumentNode::texts)
    }

    /// Serialize to a complete, styled HTML page.
    pub fn to_html(&self) -> String {
        super::html::render_html(self)
    }
}

/// Remove Markdown emphasis markers the line classifier did not consume.
///
/// Headings are only recognised when a whole line is wrapped in `*`, so
/// inline `**bold**` or `*italic*` would otherwise leak into the output.
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace('*', "")
}
