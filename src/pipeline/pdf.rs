//! Document rendering: [`DocumentTree`] → PDF or HTML bytes.
//!
//! The PDF is laid out directly from the tree with `lopdf`, using the three
//! standard Helvetica faces every PDF viewer ships. Standard fonts need no
//! embedding, which keeps a forty-page notes document in the tens of
//! kilobytes, but they only cover the WinAnsi character set: text is encoded
//! with [`encode_win_ansi`] and anything outside it prints as `?`.
//!
//! Layout is a single top-to-bottom flow. Each block asks the canvas for the
//! vertical space it needs and the canvas starts a new page when the space
//! is not left on the current one. Coloured boxes (quotes, callouts, table
//! headers) are painted as one band per text line so they split cleanly
//! across pages.

use crate::config::PageLayout;
use crate::error::DocGenError;
use crate::markup::html::{render_html, SOLUTION_DISCLAIMER, SOLUTION_SUBTITLE, SOLUTION_TITLE};
use crate::markup::{CalloutKind, DocumentNode, DocumentTree, Mode, TableRow};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Serialises a document tree into a deliverable file format.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, DocGenError>;

    /// MIME type of the bytes returned by [`DocumentRenderer::render`].
    fn mime_type(&self) -> &'static str;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;
}

/// Renders the styled HTML page.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, DocGenError> {
        Ok(render_html(tree).into_bytes())
    }

    fn mime_type(&self) -> &'static str {
        "text/html"
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

/// Renders a paginated PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer {
    layout: PageLayout,
}

impl PdfRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, tree: &DocumentTree) -> Result<Vec<u8>, DocGenError> {
        let mut canvas = Canvas::new(self.layout);
        if tree.mode == Mode::Solution {
            canvas.banner();
        }
        for node in &tree.nodes {
            canvas.node(node);
        }
        if tree.mode == Mode::Solution {
            canvas.disclaimer();
        }
        let pages = canvas.finish();
        debug!("Laid out {} PDF pages", pages.len());
        assemble(pages, self.layout, document_title(tree.mode))
    }

    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

fn document_title(mode: Mode) -> &'static str {
    match mode {
        Mode::Notes => "Study Notes",
        Mode::Solution => "Question Paper Solutions",
    }
}

// ── Fonts and colours ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Italic];

    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
        }
    }

    /// Average advance width as a fraction of the font size.
    ///
    /// Slightly above Helvetica's real average so wrapped lines never
    /// overrun the margin.
    fn width_factor(self) -> f32 {
        match self {
            Font::Bold => 0.58,
            Font::Regular | Font::Italic => 0.53,
        }
    }
}

type Rgb = [f32; 3];

const BODY: Rgb = [0.20, 0.20, 0.20];
const TITLE: Rgb = [0.17, 0.24, 0.31];
const HEADING_MAJOR: Rgb = [0.16, 0.50, 0.73];
const HEADING_MINOR: Rgb = [0.33, 0.33, 0.33];
const MUTED: Rgb = [0.47, 0.47, 0.47];
const ACCENT: Rgb = [0.20, 0.60, 0.86];
const QUOTE_BG: Rgb = [0.93, 0.95, 0.95];
const APPROACH_BG: Rgb = [0.94, 0.97, 0.98];
const ANSWER_BG: Rgb = [0.91, 0.96, 0.97];
const TABLE_HEADER_BG: Rgb = [0.95, 0.95, 0.95];
const GRID: Rgb = [0.80, 0.80, 0.80];

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: Font,
    size: f32,
    color: Rgb,
}

impl TextStyle {
    fn leading(self) -> f32 {
        self.size * 1.4
    }
}

/// Background painted behind each line of a boxed block.
#[derive(Debug, Clone, Copy)]
struct Band {
    color: Rgb,
    bar: Option<Rgb>,
    x: f32,
    width: f32,
}

const BAND_PAD: f32 = 6.0;
const BAR_WIDTH: f32 = 3.0;
const LIST_INDENT: f32 = 20.0;
const CELL_PAD: f32 = 4.0;

// ── Canvas ──────────────────────────────────────────────────────────────────

struct Canvas {
    layout: PageLayout,
    width: f32,
    height: f32,
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    cursor: f32,
}

impl Canvas {
    fn new(layout: PageLayout) -> Self {
        let (width, height) = layout.size.dimensions();
        Self {
            layout,
            width,
            height,
            done: Vec::new(),
            current: Vec::new(),
            cursor: height - layout.margin,
        }
    }

    fn top(&self) -> f32 {
        self.height - self.layout.margin
    }

    fn left(&self) -> f32 {
        self.layout.margin
    }

    fn content_width(&self) -> f32 {
        self.layout.content_width()
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= self.top()
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.done.push(page);
        self.cursor = self.top();
    }

    /// Start a new page unless `needed` points still fit on this one.
    fn ensure(&mut self, needed: f32) {
        if self.cursor - needed < self.layout.margin && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Vertical whitespace; swallowed at the top of a page.
    fn gap(&mut self, amount: f32) {
        if self.at_page_top() {
            return;
        }
        if self.cursor - amount < self.layout.margin {
            self.new_page();
        } else {
            self.cursor -= amount;
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }

    fn style(&self, font: Font, scale: f32, color: Rgb) -> TextStyle {
        TextStyle {
            font,
            size: self.layout.font_size * scale,
            color,
        }
    }

    // ── Drawing primitives ──────────────────────────────────────────────────

    fn draw_text(&mut self, x: f32, baseline: f32, style: TextStyle, text: &str) {
        if text.is_empty() {
            return;
        }
        let [r, g, b] = style.color;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![name(style.font.resource_name()), style.size.into()],
            ),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let [r, g, b] = color;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let [r, g, b] = color;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn rule(&mut self, color: Rgb, thickness: f32) {
        let x = self.left();
        let w = self.content_width();
        let y = self.cursor - thickness;
        self.fill_rect(x, y, w, thickness, color);
        self.cursor -= thickness;
    }

    // ── Text flow ───────────────────────────────────────────────────────────

    /// Write one already-wrapped line at the cursor and advance.
    fn line(&mut self, x: f32, style: TextStyle, text: &str, band: Option<Band>) {
        let leading = style.leading();
        self.ensure(leading);
        if let Some(band) = band {
            self.paint_band(band, leading);
        }
        let baseline = self.cursor - style.size;
        self.draw_text(x, baseline, style, text);
        self.cursor -= leading;
    }

    fn paint_band(&mut self, band: Band, height: f32) {
        let y = self.cursor - height;
        self.fill_rect(band.x, y, band.width, height, band.color);
        if let Some(bar) = band.bar {
            self.fill_rect(band.x, y, BAR_WIDTH, height, bar);
        }
    }

    /// Band-only padding line above or below a boxed block.
    fn band_padding(&mut self, band: Band) {
        self.ensure(BAND_PAD);
        self.paint_band(band, BAND_PAD);
        self.cursor -= BAND_PAD;
    }

    fn paragraph(&mut self, x: f32, width: f32, style: TextStyle, text: &str, band: Option<Band>) {
        for line in wrap(text, width, style) {
            self.line(x, style, &line, band);
        }
    }

    fn centered(&mut self, style: TextStyle, text: &str) {
        for line in wrap(text, self.content_width(), style) {
            let w = text_width(&line, style);
            let x = (self.width - w) / 2.0;
            self.line(x.max(self.left()), style, &line, None);
        }
    }

    // ── Blocks ──────────────────────────────────────────────────────────────

    fn node(&mut self, node: &DocumentNode) {
        let base = self.layout.font_size;
        match node {
            DocumentNode::Heading { level, text } => {
                let style = if *level <= 2 {
                    self.style(Font::Bold, 1.45, HEADING_MAJOR)
                } else {
                    self.style(Font::Bold, 1.2, HEADING_MINOR)
                };
                self.gap(base * 0.8);
                // Keep the heading on the same page as the next line.
                self.ensure(style.leading() + base * 1.4);
                self.paragraph(self.left(), self.content_width(), style, text, None);
                self.gap(base * 0.2);
            }
            DocumentNode::Paragraph { text } if text.is_empty() => self.gap(base * 0.7),
            DocumentNode::Paragraph { text } => {
                let style = self.style(Font::Regular, 1.0, BODY);
                self.paragraph(self.left(), self.content_width(), style, text, None);
                self.gap(base * 0.5);
            }
            DocumentNode::List { ordered, items } => self.list(*ordered, items),
            DocumentNode::BlockQuote { text } => {
                let band = Band {
                    color: QUOTE_BG,
                    bar: Some(ACCENT),
                    x: self.left(),
                    width: self.content_width(),
                };
                let style = self.style(Font::Italic, 1.0, HEADING_MINOR);
                let indent = 15.0;
                self.gap(base * 0.3);
                self.band_padding(band);
                self.paragraph(
                    self.left() + indent,
                    self.content_width() - 2.0 * indent,
                    style,
                    text,
                    Some(band),
                );
                self.band_padding(band);
                self.gap(base * 0.6);
            }
            DocumentNode::Table { rows } => self.table(rows),
            DocumentNode::Callout { kind, text, body } => self.callout(*kind, text, body),
        }
    }

    fn list(&mut self, ordered: bool, items: &[String]) {
        let style = self.style(Font::Regular, 1.0, BODY);
        let marker_x = self.left() + 6.0;
        let text_x = self.left() + LIST_INDENT;
        let width = self.content_width() - LIST_INDENT;
        for (i, item) in items.iter().enumerate() {
            let lines = wrap(item, width, style);
            for (j, line) in lines.iter().enumerate() {
                self.ensure(style.leading());
                if j == 0 {
                    let marker = if ordered {
                        format!("{}.", i + 1)
                    } else {
                        "\u{2022}".to_string()
                    };
                    let baseline = self.cursor - style.size;
                    self.draw_text(marker_x, baseline, style, &marker);
                }
                self.line(text_x, style, line, None);
            }
            self.gap(style.size * 0.25);
        }
        self.gap(self.layout.font_size * 0.4);
    }

    fn table(&mut self, rows: &[TableRow]) {
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let col_width = self.content_width() / columns as f32;
        let body = self.style(Font::Regular, 0.95, BODY);
        let header = self.style(Font::Bold, 0.95, BODY);

        self.gap(self.layout.font_size * 0.3);
        for row in rows {
            let style = if row.is_header { header } else { body };
            let cells: Vec<Vec<String>> = (0..columns)
                .map(|c| {
                    let text = row.cells.get(c).map(String::as_str).unwrap_or("");
                    wrap(text, col_width - 2.0 * CELL_PAD, style)
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let leading = style.leading();
            let page_room = self.top() - self.layout.margin;

            // Rows taller than a page continue on the next one, each part
            // with its own grid.
            let mut start = 0;
            while start < line_count {
                let remaining = line_count - start;
                let count = if remaining as f32 * leading + 2.0 * CELL_PAD > page_room {
                    if self.rows_fitting(leading) == 0 {
                        self.new_page();
                    }
                    remaining.min(self.rows_fitting(leading).max(1))
                } else {
                    self.ensure(remaining as f32 * leading + 2.0 * CELL_PAD);
                    remaining
                };
                self.row_segment(&cells, start..start + count, col_width, style, row.is_header);
                start += count;
                if start < line_count {
                    self.new_page();
                }
            }
        }
        self.gap(self.layout.font_size * 0.8);
    }

    /// Cell lines that still fit between the cursor and the bottom margin.
    fn rows_fitting(&self, leading: f32) -> usize {
        let room = self.cursor - self.layout.margin - 2.0 * CELL_PAD;
        (room / leading).floor().max(0.0) as usize
    }

    /// Draw lines `range` of every cell as one bordered row at the cursor.
    fn row_segment(
        &mut self,
        cells: &[Vec<String>],
        range: std::ops::Range<usize>,
        col_width: f32,
        style: TextStyle,
        is_header: bool,
    ) {
        let height = range.len() as f32 * style.leading() + 2.0 * CELL_PAD;
        let top = self.cursor;
        let y = top - height;
        for c in 0..cells.len() {
            let x = self.left() + c as f32 * col_width;
            if is_header {
                self.fill_rect(x, y, col_width, height, TABLE_HEADER_BG);
            }
            self.stroke_rect(x, y, col_width, height, GRID);
        }
        for (c, lines) in cells.iter().enumerate() {
            let x = self.left() + c as f32 * col_width + CELL_PAD;
            let segment = lines.iter().skip(range.start).take(range.len());
            for (l, line) in segment.enumerate() {
                let baseline = top - CELL_PAD - l as f32 * style.leading() - style.size;
                self.draw_text(x, baseline, style, line);
            }
        }
        self.cursor = y;
    }

    fn callout(&mut self, kind: CalloutKind, text: &str, body: &[String]) {
        let band = match kind {
            CalloutKind::Approach => Band {
                color: APPROACH_BG,
                bar: Some(ACCENT),
                x: self.left(),
                width: self.content_width(),
            },
            CalloutKind::Answer => Band {
                color: ANSWER_BG,
                bar: None,
                x: self.left(),
                width: self.content_width(),
            },
        };
        let label = self.style(Font::Bold, 1.2, HEADING_MINOR);
        let font = match kind {
            CalloutKind::Approach => Font::Regular,
            CalloutKind::Answer => Font::Bold,
        };
        let style = self.style(font, 1.0, BODY);
        let indent = 10.0;
        let x = self.left() + indent;
        let width = self.content_width() - 2.0 * indent;

        self.gap(self.layout.font_size * 0.4);
        self.ensure(BAND_PAD + label.leading() + style.leading());
        self.band_padding(band);
        self.line(x, label, kind.label(), Some(band));
        for para in std::iter::once(text).chain(body.iter().map(String::as_str)) {
            self.paragraph(x, width, style, para, Some(band));
        }
        self.band_padding(band);
        self.gap(self.layout.font_size * 0.8);
    }

    fn banner(&mut self) {
        let title = self.style(Font::Bold, 1.8, TITLE);
        let subtitle = self.style(Font::Regular, 1.0, MUTED);
        self.centered(title, SOLUTION_TITLE);
        self.centered(subtitle, SOLUTION_SUBTITLE);
        self.gap(4.0);
        self.rule(HEADING_MAJOR, 1.5);
        self.gap(self.layout.font_size * 1.5);
    }

    fn disclaimer(&mut self) {
        let style = self.style(Font::Italic, 0.85, MUTED);
        self.gap(self.layout.font_size * 1.5);
        self.ensure(1.0 + 6.0 + style.leading() * SOLUTION_DISCLAIMER.len() as f32);
        self.rule(GRID, 1.0);
        self.gap(6.0);
        for line in SOLUTION_DISCLAIMER {
            self.centered(style, line);
        }
    }
}

// ── Text measurement ────────────────────────────────────────────────────────

fn text_width(text: &str, style: TextStyle) -> f32 {
    text.chars().count() as f32 * style.size * style.font.width_factor()
}

/// Greedy word wrap. Words wider than a line are broken mid-word.
fn wrap(text: &str, width: f32, style: TextStyle) -> Vec<String> {
    let per_char = style.size * style.font.width_factor();
    let max_chars = ((width / per_char).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for the standard fonts' WinAnsiEncoding.
///
/// Latin-1 maps to itself, the typographic punctuation models like to emit
/// maps to its WinAnsi slot, tabs become spaces, and everything else
/// becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            '\u{2212}' => b'-',
            _ => b'?',
        })
        .collect()
}

// ── Document assembly ───────────────────────────────────────────────────────

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn literal(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

fn assemble(
    pages: Vec<Vec<Operation>>,
    layout: PageLayout,
    title: &str,
) -> Result<Vec<u8>, DocGenError> {
    let (width, height) = layout.size.dimensions();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Font")),
            ("Subtype", name("Type1")),
            ("BaseFont", name(font.base_font())),
            ("Encoding", name("WinAnsiEncoding")),
        ]));
        fonts.set(font.resource_name(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(fonts),
    )]));

    let media_box: Vec<Object> = vec![0.into(), 0.into(), width.into(), height.into()];
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| DocGenError::RenderFailed(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id: ObjectId = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Page")),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", Object::Array(media_box.clone())),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", name("Catalog")),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter(vec![
        ("Title", literal(title)),
        ("Producer", literal(concat!("gradegear-docgen ", env!("CARGO_PKG_VERSION")))),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DocGenError::RenderFailed(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSize;
    use crate::markup::convert;

    /// Text shown by every `Tj` operator, page by page.
    fn page_texts(pdf: &[u8]) -> Vec<Vec<String>> {
        let doc = Document::load_mem(pdf).expect("valid PDF");
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let raw = doc.get_page_content(page_id).expect("page content");
                Content::decode(&raw)
                    .expect("decodable content")
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .map(|op| String::from_utf8_lossy(op.operands[0].as_str().unwrap()).into_owned())
                    .collect()
            })
            .collect()
    }

    fn render(text: &str, mode: Mode) -> Vec<u8> {
        PdfRenderer::default().render(&convert(text, mode)).unwrap()
    }

    #[test]
    fn produces_a_loadable_pdf() {
        let pdf = render("**Kinematics**\nVelocity is the rate of change of position.", Mode::Notes);
        assert!(pdf.starts_with(b"%PDF-1.5"));
        let texts = page_texts(&pdf);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0][0], "Kinematics");
        assert!(texts[0].iter().any(|t| t.starts_with("Velocity is")));
    }

    #[test]
    fn empty_tree_still_has_one_page() {
        let pdf = PdfRenderer::default()
            .render(&DocumentTree::new(Mode::Solution, Vec::new()))
            .unwrap();
        let texts = page_texts(&pdf);
        assert_eq!(texts.len(), 1);
        // Banner and disclaimer only.
        assert_eq!(texts[0][0], SOLUTION_TITLE);
        assert_eq!(texts[0].last().unwrap(), SOLUTION_DISCLAIMER[1]);
    }

    #[test]
    fn solution_chrome_wraps_content() {
        let pdf = render(
            "Question 1: what is 2+2?\nApproach: add them\nSolution:\nAnswer: 4",
            Mode::Solution,
        );
        let texts = page_texts(&pdf).concat();
        let pos = |needle: &str| texts.iter().position(|t| t == needle).unwrap();
        assert!(pos(SOLUTION_TITLE) < pos("Approach"));
        assert!(pos("add them") < pos("Answer"));
        assert!(pos("4") < pos(SOLUTION_DISCLAIMER[0]));
    }

    #[test]
    fn notes_have_no_banner() {
        let texts = page_texts(&render("hello", Mode::Notes)).concat();
        assert_eq!(texts, vec!["hello".to_string()]);
    }

    #[test]
    fn long_documents_paginate() {
        let text = (0..200)
            .map(|i| format!("Paragraph number {i} with some filler text."))
            .collect::<Vec<_>>()
            .join("\n");
        let texts = page_texts(&render(&text, Mode::Notes));
        assert!(texts.len() > 1, "expected several pages, got {}", texts.len());
        let all = texts.concat();
        assert_eq!(all.len(), 200);
        assert_eq!(all[199], "Paragraph number 199 with some filler text.");
    }

    #[test]
    fn list_markers_and_table_cells_are_drawn() {
        let texts = page_texts(&render("1. first\n2. second\nh1|h2\nv1|v2", Mode::Notes)).concat();
        for expected in ["1.", "first", "2.", "second", "h1", "h2", "v1", "v2"] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn letter_pages_use_letter_media_box() {
        let layout = PageLayout {
            size: PageSize::Letter,
            ..PageLayout::default()
        };
        let pdf = PdfRenderer::new(layout).render(&convert("x", Mode::Notes)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 612.0);
    }

    #[test]
    fn html_renderer_matches_render_html() {
        let tree = convert("> quoted", Mode::Notes);
        let bytes = HtmlRenderer.render(&tree).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), render_html(&tree));
        assert_eq!(HtmlRenderer.extension(), "html");
        assert_eq!(PdfRenderer::default().mime_type(), "application/pdf");
    }

    #[test]
    fn win_ansi_encoding() {
        assert_eq!(encode_win_ansi("abc"), b"abc");
        assert_eq!(encode_win_ansi("café"), b"caf\xE9");
        assert_eq!(encode_win_ansi("\u{201C}x\u{201D}"), b"\x93x\x94");
        assert_eq!(encode_win_ansi("\u{2014}\u{2022}"), b"\x97\x95");
        assert_eq!(encode_win_ansi("π≤"), b"??");
        assert_eq!(encode_win_ansi("a\tb"), b"a b");
    }

    #[test]
    fn wrap_respects_width() {
        let style = TextStyle {
            font: Font::Regular,
            size: 10.0,
            color: BODY,
        };
        // 5.3pt per char → 10 chars per 55pt line.
        let lines = wrap("aaaa bbbb cccc dddd", 55.0, style);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
        let long = wrap("abcdefghijklmnopqrstuvwxyz", 55.0, style);
        assert_eq!(long, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
        assert_eq!(wrap("", 55.0, style), vec![String::new()]);
    }

    /// `Td` baselines of every page.
    fn baselines(pdf: &[u8]) -> Vec<f32> {
        let doc = Document::load_mem(pdf).expect("valid PDF");
        let mut ys = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let raw = doc.get_page_content(page_id).expect("page content");
            for op in Content::decode(&raw).unwrap().operations {
                if op.operator == "Td" {
                    ys.push(op.operands[1].as_float().unwrap());
                }
            }
        }
        ys
    }

    #[test]
    fn table_row_taller_than_a_page_is_split() {
        let long_cell = vec!["lorem"; 900].join(" ");
        let text = format!("c1|c2|c3|c4|c5|c6\n{long_cell}|b|c|d|e|f");
        let pdf = render(&text, Mode::Notes);

        let margin = PageLayout::default().margin;
        let ys = baselines(&pdf);
        assert!(!ys.is_empty());
        for y in ys {
            assert!(y >= margin, "text drawn below the bottom margin at y={y}");
        }

        let pages = page_texts(&pdf);
        assert!(pages.len() > 5, "expected the row to span pages, got {}", pages.len());
        let words: usize = pages
            .concat()
            .iter()
            .map(|t| t.matches("lorem").count())
            .sum();
        assert_eq!(words, 900);
    }

    #[test]
    fn short_rows_stay_whole() {
        let pdf = render("a|b\n1|2\n3|4", Mode::Notes);
        assert_eq!(page_texts(&pdf), vec![vec!["a", "b", "1", "2", "3", "4"]]);
    }
}
