// HTML import
// Parses clipboard HTML with html5ever and hands the <body> contents to the
// sanitizer as MarkupNodes.

use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::trace;

use super::document_tree::Node;
use super::sanitizer::{MarkupNode, Sanitizer};

/// Parse an HTML document or fragment. Only the contents of `<body>` are
/// returned; `<head>` never reaches the document.
pub fn parse_html(html: &str) -> Vec<MarkupNode> {
    let dom = parse_document(RcDom::default(), Default::default()).one(StrTendril::from(html));
    let Some(body) = find_element(&dom.document, "body") else {
        return Vec::new();
    };
    convert_children(&body, false)
}

/// Parse and sanitize in one step
pub fn sanitize_html(html: &str, sanitizer: &Sanitizer) -> Vec<Node> {
    let markup = parse_html(html);
    trace!(nodes = markup.len(), "parsed clipboard html");
    sanitizer.sanitize(&markup)
}

/// Elements that start a new line; newline-only whitespace between them is
/// source indentation
const BLOCK_TAGS: &[&str] = &["p", "div", "blockquote", "br", "pre"];

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data
        && (*name.local).eq_ignore_ascii_case(tag)
    {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

fn convert_children(handle: &Handle, preformatted: bool) -> Vec<MarkupNode> {
    let children = handle.children.borrow();
    children
        .iter()
        .enumerate()
        .filter(|(index, _)| preformatted || !is_block_gap(&children, *index))
        .filter_map(|(_, child)| convert(child, preformatted))
        .collect()
}

fn is_block(handle: &Handle) -> bool {
    match &handle.data {
        NodeData::Element { name, .. } => BLOCK_TAGS
            .iter()
            .any(|tag| (*name.local).eq_ignore_ascii_case(tag)),
        _ => false,
    }
}

/// Whitespace-only text with a newline whose neighbours are all block elements
fn is_block_gap(siblings: &[Handle], index: usize) -> bool {
    let NodeData::Text { contents } = &siblings[index].data else {
        return false;
    };
    let text = contents.borrow();
    if !text.contains('\n') || !text.trim().is_empty() {
        return false;
    }
    let before = index.checked_sub(1).and_then(|i| siblings.get(i));
    let after = siblings.get(index + 1);
    (before.is_some() || after.is_some()) && before.into_iter().chain(after).all(is_block)
}

fn convert(handle: &Handle, preformatted: bool) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let preformatted = preformatted || (*name.local).eq_ignore_ascii_case("pre");
            Some(MarkupNode::Element {
                tag: name.local.to_string(),
                attributes,
                children: convert_children(handle, preformatted),
            })
        }
        _ => Some(MarkupNode::Other),
    }
}
