//! Line classification: decide what a single trimmed line is.
//!
//! Classification is pure. It never looks at the tree being built, only at
//! the conversion mode and the current [`Section`], so the precedence order
//! below can be tested line by line.
//!
//! Precedence (first match wins):
//!
//! | # | Mode     | Rule                                   | Result                  |
//! |---|----------|----------------------------------------|-------------------------|
//! | – | Solution | blank line                             | [`LineKind::Skip`]      |
//! | a | Solution | starts with `question` / `q.`          | `Question`              |
//! | b | Solution | starts with `approach:`                | `ApproachStart`         |
//! | – | Solution | inside Approach, not `solution:`/`answer:` | `ApproachContinuation` |
//! | c | Solution | starts with `solution:`                | `SolutionHeading`       |
//! | d | Solution | starts with `answer:`                  | `Answer`                |
//! | e | both     | wrapped in `**…**`                     | `MajorHeading`          |
//! | f | both     | wrapped in `*…*`                       | `MinorHeading`          |
//! | g | both     | starts with `- `                       | `UnorderedItem`         |
//! | h | both     | digit followed by `.`                  | `OrderedItem`           |
//! | i | both     | starts with `> `                       | `BlockQuote`            |
//! | j | both     | contains `\|`                          | `TableRow` / `DroppedTableLine` |
//! | k | both     | anything else                          | `Paragraph`             |
//!
//! Section labels are matched case-insensitively.

use super::node::Mode;

/// The labelled part of a worked solution the pass is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    None,
    Question,
    Approach,
    Solution,
    Answer,
}

/// What one line of input is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Ignored entirely (blank line in Solution mode).
    Skip,
    /// `Question …` / `Q. …` line; carries the full line.
    Question(&'a str),
    /// `Approach: …`; carries the text after the label.
    ApproachStart(&'a str),
    /// A line that belongs to the open Approach box.
    ApproachContinuation(&'a str),
    /// `Solution: …`; carries the full line.
    SolutionHeading(&'a str),
    /// `Answer: …`; carries the text after the label.
    Answer(&'a str),
    /// `**…**` line, wrapping removed.
    MajorHeading(&'a str),
    /// `*…*` line, wrapping removed.
    MinorHeading(&'a str),
    UnorderedItem(&'a str),
    OrderedItem(&'a str),
    BlockQuote(&'a str),
    /// Pipe-delimited row with at least two non-empty cells.
    TableRow(Vec<&'a str>),
    /// Contains `|` but fewer than two non-empty cells. Emits nothing.
    DroppedTableLine,
    Paragraph(&'a str),
}

/// Classify an already trimmed line.
pub fn classify(line: &str, mode: Mode, section: Section) -> LineKind<'_> {
    if mode == Mode::Solution {
        if let Some(kind) = classify_section_label(line, section) {
            return kind;
        }
    }
    classify_block(line)
}

fn classify_section_label(line: &str, section: Section) -> Option<LineKind<'_>> {
    if line.is_empty() {
        return Some(LineKind::Skip);
    }
    if starts_with_ci(line, "question") || starts_with_ci(line, "q.") {
        return Some(LineKind::Question(line));
    }
    if let Some(rest) = strip_prefix_ci(line, "approach:") {
        return Some(LineKind::ApproachStart(rest.trim()));
    }

    let solution = starts_with_ci(line, "solution:");
    let answer = strip_prefix_ci(line, "answer:");

    if section == Section::Approach && !solution && answer.is_none() {
        return Some(LineKind::ApproachContinuation(line));
    }
    if solution {
        return Some(LineKind::SolutionHeading(line));
    }
    answer.map(|rest| LineKind::Answer(rest.trim()))
}

fn classify_block(line: &str) -> LineKind<'_> {
    if line.starts_with("**") && line.ends_with("**") {
        LineKind::MajorHeading(line.trim_matches('*').trim())
    } else if line.starts_with('*') && line.ends_with('*') {
        LineKind::MinorHeading(line.trim_matches('*').trim())
    } else if let Some(rest) = line.strip_prefix("- ") {
        LineKind::UnorderedItem(rest.trim())
    } else if let Some(rest) = ordered_item(line) {
        LineKind::OrderedItem(rest.trim())
    } else if let Some(rest) = line.strip_prefix("> ") {
        LineKind::BlockQuote(rest.trim())
    } else if line.contains('|') {
        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        if cells.len() >= 2 {
            LineKind::TableRow(cells)
        } else {
            LineKind::DroppedTableLine
        }
    } else {
        LineKind::Paragraph(line)
    }
}

/// `1. text` → `Some(" text")`. Only a single leading digit is a marker, so
/// `10. text` is a paragraph. Any Unicode digit counts (`١. text`).
fn ordered_item(line: &str) -> Option<&str> {
    let mut chars = line.char_indices();
    let (_, first) = chars.next()?;
    let (dot, second) = chars.next()?;
    if first.is_numeric() && second == '.' {
        Some(&line[dot + 1..])
    } else {
        None
    }
}

fn starts_with_ci(line: &str, prefix: &str) -> bool {
    strip_prefix_ci(line, prefix).is_some()
}

/// ASCII case-insensitive `strip_prefix`. `prefix` must be ASCII.
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(line: &str) -> LineKind<'_> {
        classify(line, Mode::Notes, Section::None)
    }

    fn solution(line: &str) -> LineKind<'_> {
        classify(line, Mode::Solution, Section::None)
    }

    #[test]
    fn headings() {
        assert_eq!(notes("**Title**"), LineKind::MajorHeading("Title"));
        assert_eq!(notes("*Sub*"), LineKind::MinorHeading("Sub"));
        assert_eq!(notes("**"), LineKind::MajorHeading(""));
        assert_eq!(notes("*"), LineKind::MinorHeading(""));
        // Only opening marker: not a heading.
        assert_eq!(notes("**Bold** start"), LineKind::Paragraph("**Bold** start"));
    }

    #[test]
    fn list_markers() {
        assert_eq!(notes("- item"), LineKind::UnorderedItem("item"));
        assert_eq!(notes("1. first"), LineKind::OrderedItem("first"));
        assert_eq!(notes("7.seventh"), LineKind::OrderedItem("seventh"));
        assert_eq!(notes("10. tenth"), LineKind::Paragraph("10. tenth"));
        assert_eq!(notes("-no space"), LineKind::Paragraph("-no space"));
    }

    #[test]
    fn block_quote_needs_space() {
        assert_eq!(notes("> quoted"), LineKind::BlockQuote("quoted"));
        assert_eq!(notes(">tight"), LineKind::Paragraph(">tight"));
    }

    #[test]
    fn table_rows_and_dropped_lines() {
        assert_eq!(notes("a|b|c"), LineKind::TableRow(vec!["a", "b", "c"]));
        assert_eq!(notes("| x | y |"), LineKind::TableRow(vec!["x", "y"]));
        assert_eq!(notes("no pipe content|"), LineKind::DroppedTableLine);
        assert_eq!(notes("|"), LineKind::DroppedTableLine);
    }

    #[test]
    fn list_marker_wins_over_table() {
        assert_eq!(notes("- a | b"), LineKind::UnorderedItem("a | b"));
    }

    #[test]
    fn blank_line_is_paragraph_in_notes_mode() {
        assert_eq!(notes(""), LineKind::Paragraph(""));
    }

    #[test]
    fn blank_line_is_skipped_in_solution_mode() {
        assert_eq!(solution(""), LineKind::Skip);
    }

    #[test]
    fn notes_mode_ignores_section_labels() {
        assert_eq!(notes("Question: 1"), LineKind::Paragraph("Question: 1"));
        assert_eq!(notes("Answer: 4"), LineKind::Paragraph("Answer: 4"));
    }

    #[test]
    fn section_labels_are_case_insensitive() {
        assert_eq!(solution("QUESTION 1"), LineKind::Question("QUESTION 1"));
        assert_eq!(solution("q. 2"), LineKind::Question("q. 2"));
        assert_eq!(solution("Approach: add"), LineKind::ApproachStart("add"));
        assert_eq!(
            solution("SOLUTION: add"),
            LineKind::SolutionHeading("SOLUTION: add")
        );
        assert_eq!(solution("answer:   4 "), LineKind::Answer("4"));
    }

    #[test]
    fn question_prefix_needs_no_colon() {
        assert_eq!(
            solution("Questions below"),
            LineKind::Question("Questions below")
        );
    }

    #[test]
    fn approach_section_absorbs_lines() {
        let inside = |l| classify(l, Mode::Solution, Section::Approach);
        assert_eq!(inside("- step one"), LineKind::ApproachContinuation("- step one"));
        assert_eq!(inside("**bold**"), LineKind::ApproachContinuation("**bold**"));
        assert_eq!(inside("Solution: x"), LineKind::SolutionHeading("Solution: x"));
        assert_eq!(inside("Answer: 4"), LineKind::Answer("4"));
        assert_eq!(inside("Question 2"), LineKind::Question("Question 2"));
        assert_eq!(inside("Approach: again"), LineKind::ApproachStart("again"));
    }

    #[test]
    fn solution_mode_falls_through_to_blocks() {
        assert_eq!(solution("- item"), LineKind::UnorderedItem("item"));
        assert_eq!(solution("plain"), LineKind::Paragraph("plain"));
    }

    #[test]
    fn non_ascii_prefix_does_not_panic() {
        assert_eq!(solution("é"), LineKind::Paragraph("é"));
        assert_eq!(solution("ééééé"), LineKind::Paragraph("ééééé"));
    }

    #[test]
    fn unicode_digit_marks_ordered_item() {
        assert_eq!(notes("١. arabic digit"), LineKind::OrderedItem("arabic digit"));
        assert_eq!(notes("३.devanagari"), LineKind::OrderedItem("devanagari"));
        assert_eq!(notes("١٠. two digits"), LineKind::Paragraph("١٠. two digits"));
        assert_eq!(notes("a. letter"), LineKind::Paragraph("a. letter"));
    }
}
