//! HTML serialization of a [`DocumentTree`].
//!
//! Tag mapping is fixed: headings → `h2`/`h3`, paragraphs → `p`, lists →
//! `ul`/`ol`, quotes → `blockquote`, tables → `table` with a `th` header row,
//! callouts → `div.approach` / `div.answer`. Every page carries the same
//! stylesheet; solution documents get a title banner and a disclaimer
//! footer around the body.

use super::node::{DocumentNode, DocumentTree, Mode, TableRow};
use std::borrow::Cow;

/// Stylesheet embedded in every generated page.
pub const STYLESHEET: &str = r#"
body {
    font-family: Arial, sans-serif;
    font-size: 14px;
    line-height: 1.6;
    color: #333;
    padding: 20px;
    background-color: #f9f9f9;
}
h1, h2, h3 {
    color: #2c3e50;
    margin-top: 20px;
    margin-bottom: 10px;
}
h1 {
    font-size: 22px;
    font-weight: bold;
    text-transform: uppercase;
    border-bottom: 2px solid #2980b9;
    padding-bottom: 5px;
}
h2 {
    font-size: 20px;
    font-weight: bold;
    color: #2980b9;
    margin-bottom: 5px;
}
h3 {
    font-size: 18px;
    font-weight: bold;
    color: #555;
    margin-bottom: 5px;
}
p {
    margin-bottom: 10px;
    text-align: justify;
}
ul, ol {
    padding-left: 20px;
    margin-bottom: 10px;
}
li {
    margin-bottom: 5px;
    line-height: 1.6;
}
blockquote {
    padding: 10px 20px;
    margin: 10px 0;
    background-color: #eef2f3;
    border-left: 5px solid #3498db;
    font-style: italic;
    color: #555;
}
table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 20px;
}
table, th, td {
    border: 1px solid #ccc;
    padding: 8px;
    text-align: left;
}
th {
    background-color: #f2f2f2;
    font-weight: bold;
}
.header {
    text-align: center;
    margin-bottom: 30px;
}
.answer {
    background-color: #e8f4f8;
    padding: 10px;
    border-radius: 5px;
    margin-top: 10px;
    font-weight: bold;
}
.approach {
    background-color: #f0f7fb;
    padding: 10px;
    border-radius: 5px;
    margin-bottom: 15px;
    border-left: 3px solid #3498db;
}
.footer {
    margin-top: 30px;
    text-align: center;
    font-size: 12px;
    color: #777;
}
"#;

/// Title of solution documents.
pub const SOLUTION_TITLE: &str = "QUESTION PAPER SOLUTIONS";
/// Subtitle under [`SOLUTION_TITLE`].
pub const SOLUTION_SUBTITLE: &str = "Generated by GradeGear AI";
/// Disclaimer lines closing every solution document.
pub const SOLUTION_DISCLAIMER: [&str; 2] = [
    "This solution was generated using artificial intelligence and may not be 100% accurate.",
    "Always verify important calculations and results.",
];

/// Render a complete HTML page for the tree.
pub fn render_html(tree: &DocumentTree) -> String {
    let mut html = String::with_capacity(STYLESHEET.len() + 1024);
    html.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n<style>");
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n");

    if tree.mode == Mode::Solution {
        html.push_str("<div class=\"header\">\n");
        push_element(&mut html, "h1", SOLUTION_TITLE);
        push_element(&mut html, "p", SOLUTION_SUBTITLE);
        html.push_str("</div>\n");
    }

    html.push_str(&render_fragment(&tree.nodes));

    if tree.mode == Mode::Solution {
        html.push_str("<div class=\"footer\">\n");
        for line in SOLUTION_DISCLAIMER {
            push_element(&mut html, "p", line);
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render only the body elements, without page chrome.
pub fn render_fragment(nodes: &[DocumentNode]) -> String {
    let mut html = String::new();
    for node in nodes {
        match node {
            DocumentNode::Heading { level, text } => {
                let tag = if *level <= 2 { "h2" } else { "h3" };
                push_element(&mut html, tag, text);
            }
            DocumentNode::Paragraph { text } => push_element(&mut html, "p", text),
            DocumentNode::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                html.push_str(&format!("<{tag}>\n"));
                for item in items {
                    push_element(&mut html, "li", item);
                }
                html.push_str(&format!("</{tag}>\n"));
            }
            DocumentNode::BlockQuote { text } => push_element(&mut html, "blockquote", text),
            DocumentNode::Table { rows } => push_table(&mut html, rows),
            DocumentNode::Callout { kind, text, body } => {
                html.push_str(&format!("<div class=\"{}\">\n", kind.css_class()));
                push_element(&mut html, "h3", kind.label());
                push_element(&mut html, "p", text);
                for line in body {
                    push_element(&mut html, "p", line);
                }
                html.push_str("</div>\n");
            }
        }
    }
    html
}

fn push_table(html: &mut String, rows: &[TableRow]) {
    html.push_str("<table>\n");
    for row in rows {
        let cell_tag = if row.is_header { "th" } else { "td" };
        html.push_str("<tr>");
        for cell in &row.cells {
            html.push_str(&format!("<{cell_tag}>{}</{cell_tag}>", escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_element(html: &mut String, tag: &str, text: &str) {
    html.push_str(&format!("<{tag}>{}</{tag}>\n", escape(text)));
}

/// Escape text for use inside an HTML element.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{convert, CalloutKind};

    #[test]
    fn escape_special_characters() {
        assert_eq!(escape("x < 5 && y > 2"), "x &lt; 5 &amp;&amp; y &gt; 2");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn list_fragment() {
        let tree = convert("- a\n- b", Mode::Notes);
        assert_eq!(
            render_fragment(&tree.nodes),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
    }

    #[test]
    fn ordered_list_fragment() {
        let tree = convert("1. a", Mode::Notes);
        assert_eq!(render_fragment(&tree.nodes), "<ol>\n<li>a</li>\n</ol>\n");
    }

    #[test]
    fn table_header_uses_th() {
        let tree = convert("h1|h2\nv1|v2", Mode::Notes);
        let html = render_fragment(&tree.nodes);
        assert_eq!(
            html,
            "<table>\n<tr><th>h1</th><th>h2</th></tr>\n<tr><td>v1</td><td>v2</td></tr>\n</table>\n"
        );
    }

    #[test]
    fn callouts_render_as_labelled_divs() {
        let nodes = vec![
            DocumentNode::Callout {
                kind: CalloutKind::Approach,
                text: "plan".into(),
                body: vec!["more".into()],
            },
            DocumentNode::Callout {
                kind: CalloutKind::Answer,
                text: "42".into(),
                body: vec![],
            },
        ];
        let html = render_fragment(&nodes);
        assert!(html.contains(
            "<div class=\"approach\">\n<h3>Approach</h3>\n<p>plan</p>\n<p>more</p>\n</div>"
        ));
        assert!(html.contains("<div class=\"answer\">\n<h3>Answer</h3>\n<p>42</p>\n</div>"));
    }

    #[test]
    fn notes_page_has_no_banner() {
        let html = render_html(&convert("hello", Mode::Notes));
        assert!(html.contains("<style>"));
        assert!(html.contains("<p>hello</p>"));
        assert!(!html.contains(SOLUTION_TITLE));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn solution_page_has_banner_and_footer() {
        let html = render_html(&convert("Answer: 4", Mode::Solution));
        let title = html.find(SOLUTION_TITLE).expect("title present");
        let answer = html.find("<p>4</p>").expect("answer present");
        let footer = html.find(SOLUTION_DISCLAIMER[1]).expect("footer present");
        assert!(title < answer && answer < footer);
    }
}
