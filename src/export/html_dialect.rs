// HTML dialect
// The small HTML subset accepted by Telegram's parse_mode=HTML.

use crate::richtext::document_tree::{Document, Element, Node, TagKind};
use crate::richtext::sanitizer::SPOILER_CLASS;

use super::strip_trailing_newlines;

pub fn to_html_dialect(doc: &Document) -> String {
    let mut out = String::new();
    write_nodes(doc.children(), &mut out);
    strip_trailing_newlines(&mut out);
    out
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(value) => escape_into(value, out),
            Node::Element(element) => write_element(element, out),
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    let (open, close) = match element.kind {
        TagKind::Bold => ("<b>", "</b>"),
        TagKind::Italic => ("<i>", "</i>"),
        TagKind::Underline => ("<u>", "</u>"),
        TagKind::Strikethrough => ("<s>", "</s>"),
        TagKind::Code => ("<code>", "</code>"),
        TagKind::Blockquote => ("<blockquote>", "</blockquote>"),
        TagKind::Spoiler => {
            out.push_str("<span class=\"");
            out.push_str(SPOILER_CLASS);
            out.push_str("\">");
            write_nodes(&element.children, out);
            out.push_str("</span>");
            return;
        }
        TagKind::Link => {
            out.push_str("<a href=\"");
            escape_into(element.href().unwrap_or("#"), out);
            out.push_str("\">");
            write_nodes(&element.children, out);
            out.push_str("</a>");
            return;
        }
        TagKind::LineBreak => {
            out.push('\n');
            return;
        }
        TagKind::Paragraph => {
            write_nodes(&element.children, out);
            if !element.text_content().is_empty() {
                out.push('\n');
            }
            return;
        }
    };
    out.push_str(open);
    write_nodes(&element.children, out);
    out.push_str(close);
}
