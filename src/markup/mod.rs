//! Text-to-markup conversion: raw model output → [`DocumentTree`].
//!
//! Language models answer with loosely Markdown-flavoured text: `**bold**`
//! lines as headings, `- ` bullets, pipe tables, and (for solutions) labelled
//! `Question:` / `Approach:` / `Solution:` / `Answer:` sections. This module
//! turns that text into an ordered tree of block elements that the HTML and
//! PDF renderers consume.
//!
//! ```text
//! raw text ──split──▶ lines ──classify──▶ LineKind ──apply──▶ ConversionState ──finish──▶ DocumentTree
//! ```
//!
//! The pass is a single forward scan with no I/O and no shared state, so
//! [`convert`] is total over all strings and safe to call from any thread.
//! Unrecognised lines degrade to paragraphs; pipe lines with fewer than two
//! cells are dropped.
//!
//! ```rust
//! use gradegear_docgen::markup::{convert, DocumentNode, Mode};
//!
//! let tree = convert("**Kinematics**\n- velocity\n- acceleration", Mode::Notes);
//! assert_eq!(tree.nodes[0], DocumentNode::Heading { level: 2, text: "Kinematics".into() });
//! assert!(matches!(tree.nodes[1], DocumentNode::List { ordered: false, .. }));
//! ```

pub mod classify;
pub mod html;
pub mod node;
pub mod state;

pub use classify::{classify, LineKind, Section};
pub use html::{render_fragment, render_html};
pub use node::{strip_emphasis, CalloutKind, DocumentNode, DocumentTree, Mode, TableRow};
pub use state::ConversionState;

/// Convert raw generated text into a document tree.
pub fn convert(raw_text: &str, mode: Mode) -> DocumentTree {
    let mut state = ConversionState::new();
    for raw_line in raw_text.split('\n') {
        let line = raw_line.trim();
        let kind = classify(line, mode, state.section());
        state.apply(kind);
    }
    state.finish(mode)
}
