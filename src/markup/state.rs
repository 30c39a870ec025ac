//! Tree building: apply classified lines to the open-block state.

use super::classify::{LineKind, Section};
use super::node::{strip_emphasis, CalloutKind, DocumentNode, DocumentTree, Mode, TableRow};

#[derive(Debug)]
struct OpenList {
    ordered: bool,
    items: Vec<String>,
}

#[derive(Debug)]
struct OpenCallout {
    text: String,
    body: Vec<String>,
}

/// Mutable cursor of one conversion pass.
///
/// At most one list, one table and one Approach box are open at a time.
/// Any line that cannot extend the open block closes it, so every block is
/// emitted before the next incompatible one starts.
#[derive(Debug, Default)]
pub struct ConversionState {
    section: Section,
    list: Option<OpenList>,
    table: Option<Vec<TableRow>>,
    approach: Option<OpenCallout>,
    nodes: Vec<DocumentNode>,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn in_unordered_list(&self) -> bool {
        self.list.as_ref().is_some_and(|l| !l.ordered)
    }

    pub fn in_ordered_list(&self) -> bool {
        self.list.as_ref().is_some_and(|l| l.ordered)
    }

    pub fn in_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn open_approach_block(&self) -> bool {
        self.approach.is_some()
    }

    /// Apply one classified line.
    pub fn apply(&mut self, line: LineKind<'_>) {
        match line {
            LineKind::Skip | LineKind::DroppedTableLine => {}
            LineKind::Question(text) => {
                self.push_block(DocumentNode::heading(2, text));
                self.section = Section::Question;
            }
            LineKind::ApproachStart(text) => {
                self.close_open_blocks();
                self.approach = Some(OpenCallout {
                    text: strip_emphasis(text),
                    body: Vec::new(),
                });
                self.section = Section::Approach;
            }
            LineKind::ApproachContinuation(text) => match self.approach.as_mut() {
                Some(callout) => callout.body.push(strip_emphasis(text)),
                None => self.push_block(DocumentNode::paragraph(text)),
            },
            LineKind::SolutionHeading(text) => {
                self.push_block(DocumentNode::heading(3, text));
                self.section = Section::Solution;
            }
            LineKind::Answer(text) => {
                self.push_block(DocumentNode::callout(CalloutKind::Answer, text));
                self.section = Section::Answer;
            }
            LineKind::MajorHeading(text) => self.push_block(DocumentNode::heading(2, text)),
            LineKind::MinorHeading(text) => self.push_block(DocumentNode::heading(3, text)),
            LineKind::UnorderedItem(text) => self.push_item(false, text),
            LineKind::OrderedItem(text) => self.push_item(true, text),
            LineKind::BlockQuote(text) => self.push_block(DocumentNode::block_quote(text)),
            LineKind::TableRow(cells) => self.push_row(&cells),
            LineKind::Paragraph(text) => self.push_block(DocumentNode::paragraph(text)),
        }
    }

    /// Close everything still open and hand back the finished tree.
    pub fn finish(mut self, mode: Mode) -> DocumentTree {
        self.close_open_blocks();
        DocumentTree::new(mode, self.nodes)
    }

    fn push_block(&mut self, node: DocumentNode) {
        self.close_open_blocks();
        self.nodes.push(node);
    }

    fn push_item(&mut self, ordered: bool, text: &str) {
        self.close_table();
        self.close_approach();
        if self.list.as_ref().is_some_and(|l| l.ordered != ordered) {
            self.close_list();
        }
        self.list
            .get_or_insert_with(|| OpenList {
                ordered,
                items: Vec::new(),
            })
            .items
            .push(strip_emphasis(text));
    }

    fn push_row(&mut self, cells: &[&str]) {
        self.close_list();
        self.close_approach();
        let rows = self.table.get_or_insert_with(Vec::new);
        let is_header = rows.is_empty();
        rows.push(TableRow {
            cells: cells.iter().map(|c| strip_emphasis(c)).collect(),
            is_header,
        });
    }

    fn close_open_blocks(&mut self) {
        self.close_list();
        self.close_table();
        self.close_approach();
    }

    fn close_list(&mut self) {
        if let Some(list) = self.list.take() {
            self.nodes.push(DocumentNode::List {
                ordered: list.ordered,
                items: list.items,
            });
        }
    }

    fn close_table(&mut self) {
        if let Some(rows) = self.table.take() {
            self.nodes.push(DocumentNode::Table { rows });
        }
    }

    fn close_approach(&mut self) {
        if let Some(callout) = self.approach.take() {
            self.nodes.push(DocumentNode::Callout {
                kind: CalloutKind::Approach,
                text: callout.text,
                body: callout.body,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_accumulate_until_closed() {
        let mut state = ConversionState::new();
        state.apply(LineKind::UnorderedItem("a"));
        state.apply(LineKind::UnorderedItem("b"));
        assert!(state.in_unordered_list());
        assert!(!state.in_ordered_list());

        let tree = state.finish(Mode::Notes);
        assert_eq!(
            tree.nodes,
            vec![DocumentNode::List {
                ordered: false,
                items: vec!["a".into(), "b".into()],
            }]
        );
    }

    #[test]
    fn switching_list_kind_closes_previous_list() {
        let mut state = ConversionState::new();
        state.apply(LineKind::UnorderedItem("a"));
        state.apply(LineKind::OrderedItem("b"));
        assert!(state.in_ordered_list());

        let tree = state.finish(Mode::Notes);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree.nodes[0], DocumentNode::List { ordered: false, .. }));
        assert!(matches!(tree.nodes[1], DocumentNode::List { ordered: true, .. }));
    }

    #[test]
    fn first_row_is_header() {
        let mut state = ConversionState::new();
        state.apply(LineKind::TableRow(vec!["h1", "h2"]));
        state.apply(LineKind::TableRow(vec!["a", "b"]));
        assert!(state.in_table());

        let tree = state.finish(Mode::Notes);
        let DocumentNode::Table { rows } = &tree.nodes[0] else {
            panic!("expected table, got {:?}", tree.nodes[0]);
        };
        assert!(rows[0].is_header);
        assert!(!rows[1].is_header);
    }

    #[test]
    fn dropped_line_keeps_table_open() {
        let mut state = ConversionState::new();
        state.apply(LineKind::TableRow(vec!["h1", "h2"]));
        state.apply(LineKind::DroppedTableLine);
        state.apply(LineKind::TableRow(vec!["a", "b"]));

        let tree = state.finish(Mode::Notes);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn approach_collects_body_until_closed() {
        let mut state = ConversionState::new();
        state.apply(LineKind::ApproachStart("think"));
        assert_eq!(state.section(), Section::Approach);
        assert!(state.open_approach_block());
        state.apply(LineKind::ApproachContinuation("step *one*"));
        state.apply(LineKind::SolutionHeading("Solution: go"));
        assert!(!state.open_approach_block());

        let tree = state.finish(Mode::Solution);
        assert_eq!(
            tree.nodes[0],
            DocumentNode::Callout {
                kind: CalloutKind::Approach,
                text: "think".into(),
                body: vec!["step one".into()],
            }
        );
        assert_eq!(
            tree.nodes[1],
            DocumentNode::Heading {
                level: 3,
                text: "Solution: go".into()
            }
        );
    }

    #[test]
    fn approach_at_end_of_input_is_closed() {
        let mut state = ConversionState::new();
        state.apply(LineKind::ApproachStart("last"));
        let tree = state.finish(Mode::Solution);
        assert_eq!(tree.len(), 1);
        assert!(matches!(
            tree.nodes[0],
            DocumentNode::Callout {
                kind: CalloutKind::Approach,
                ..
            }
        ));
    }

    #[test]
    fn stray_continuation_becomes_paragraph() {
        let mut state = ConversionState::new();
        state.apply(LineKind::ApproachContinuation("orphan"));
        let tree = state.finish(Mode::Solution);
        assert_eq!(
            tree.nodes,
            vec![DocumentNode::Paragraph {
                text: "orphan".into()
            }]
        );
    }
}
