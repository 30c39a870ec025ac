//! Post-processing: deterministic cleanup of model output before conversion.
//!
//! Even with the formatting rules in the system prompt, models drift towards
//! Markdown habits the line converter does not know: ```` ``` ```` fences
//! around the whole answer, `#` headings, GFM separator rows under table
//! headers, CRLF line endings and zero-width characters. These rules fix
//! those quirks without touching content.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw answer; headings are rewritten after trailing whitespace is
//! gone so `## Title  ` becomes `**Title**` and not `**Title  **`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Rewrite ATX headings into `**…**` / `*…*` lines
/// 5. Drop GFM separator rows (`| --- | :-: |`)
/// 6. Collapse runs of blank lines to a single blank line
/// 7. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 8. Trim the whole text
pub fn clean_generated_text(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = rewrite_atx_headings(&s);
    let s = drop_separator_rows(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer fence ───────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text|plaintext)?\r?\n(.*?)\r?\n```\s*$").unwrap()
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ──────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ───────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Rewrite ATX headings ────────────────────────────────────────────

static RE_ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());

/// `#`/`##` become major headings, deeper levels minor ones. Emphasis already
/// inside the heading text is dropped so the wrapping stays balanced.
fn rewrite_atx_headings(input: &str) -> String {
    input
        .lines()
        .map(|line| match RE_ATX_HEADING.captures(line) {
            Some(caps) => {
                let text = caps[2].replace('*', "");
                let text = text.trim();
                if text.is_empty() {
                    String::new()
                } else if caps[1].len() <= 2 {
                    format!("**{text}**")
                } else {
                    format!("*{text}*")
                }
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Drop GFM separator rows ─────────────────────────────────────────
//
// The converter treats any line with a `|` as a table row, so a `|---|---|`
// line would surface as a body row of dashes. Separator rows carry no
// content; dropping them leaves header and body rows adjacent.

fn drop_separator_rows(input: &str) -> String {
    input
        .lines()
        .filter(|line| !is_separator_row(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('|')
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| c == '|' || c == '-' || c == ':' || c == ' ')
}

// ── Rule 6: Collapse blank lines ────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 7: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────
