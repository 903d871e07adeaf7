// Markdown dialect
// Telegram MarkdownV2: every reserved character in text is backslash-escaped.

use crate::richtext::document_tree::{Document, Element, Node, TagKind};

use super::strip_trailing_newlines;

const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn to_escaped_markdown(doc: &Document) -> String {
    render(doc.children())
}

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    strip_trailing_newlines(&mut out);
    out
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
    let marker = match element.kind {
        TagKind::Bold => "*",
        TagKind::Italic => "_",
        TagKind::Underline => "__",
        TagKind::Strikethrough => "~",
        TagKind::Code => "`",
        TagKind::Spoiler => "||",
        TagKind::Link => {
            out.push('[');
            write_nodes(&element.children, out);
            out.push_str("](");
            escape_into(element.href().unwrap_or("#"), out);
            out.push(')');
            return;
        }
        TagKind::Blockquote => {
            let quoted = render(&element.children)
                .split('\n')
                .map(|line| {
                    if line.trim().is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            out.push_str(&quoted);
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
    out.push_str(marker);
    write_nodes(&element.children, out);
    out.push_str(marker);
}
