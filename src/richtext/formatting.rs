// Formatting Engine
// Toggles one layer of formatting over a range. A range already inside an
// element of the requested kind unwraps that element; anything else wraps
// the selected content in a new element.

use tracing::debug;

use super::document_tree::{
    Attributes, Document, Element, Node, NodePath, TagKind, byte_offset, char_len,
    merge_text_neighbors, normalize_children,
};
use super::range::{Position, Range};

/// Content cut out of a document, and where it used to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub nodes: Vec<Node>,
    /// Element-level position the content was taken from. Text on either
    /// side of it is not merged, so a caller can insert right here.
    pub at: Position,
}

/// Toggle `kind` over `range` and return the range covering the affected
/// content afterwards.
///
/// Collapsed, stale or reversed ranges and non-toggleable kinds leave the
/// document untouched and return `range` as given.
pub fn toggle_format(
    doc: &mut Document,
    range: &Range,
    kind: TagKind,
    attributes: Attributes,
) -> Range {
    if range.is_collapsed() || !kind.is_toggleable() {
        return range.clone();
    }
    if let Err(err) = range.validate(doc) {
        debug!(%kind, %err, "ignoring toggle on invalid range");
        return range.clone();
    }

    let result = match find_existing_wrapper(doc, range, kind) {
        Some(path) => {
            debug!(%kind, ?path, "unwrapping existing element");
            unwrap_element(doc, &path)
        }
        None => wrap_range(doc, range, kind, attributes),
    };
    result.unwrap_or_else(|| range.clone())
}

/// Innermost element of `kind` that encloses the range, or the single
/// element of `kind` the range selects from the outside.
fn find_existing_wrapper(doc: &Document, range: &Range, kind: TagKind) -> Option<NodePath> {
    let bounds = range.to_boundaries(doc);
    if bounds.start.path == bounds.end.path
        && bounds.end.offset == bounds.start.offset + 1
        && let Some(children) = doc.children_at(&bounds.start.path)
        && children.get(bounds.start.offset).and_then(Node::kind) == Some(kind)
    {
        let mut path = bounds.start.path.clone();
        path.push(bounds.start.offset);
        return Some(path);
    }

    let mut path = range.common_ancestor();
    loop {
        if doc.node_at(&path).and_then(Node::kind) == Some(kind) {
            return Some(path);
        }
        path.pop()?;
    }
}

/// Replace the element at `path` with one text node holding its text content.
fn unwrap_element(doc: &mut Document, path: &[usize]) -> Option<Range> {
    let text = doc.node_at(path)?.text_content();
    let (index, parent) = path.split_last()?;

    if text.is_empty() {
        doc.remove(path)?;
        let caret = insert_nodes(doc, &Position::new(parent.to_vec(), *index), Vec::new())?;
        return Some(caret);
    }

    let len = char_len(&text);
    doc.replace_with(path, vec![Node::Text(text)])?;
    let children = doc.children_at_mut(parent)?;
    let (merged, offset) = merge_text_neighbors(children, *index);
    let mut text_path = parent.to_vec();
    text_path.push(merged);
    Some(Range::in_text(text_path, offset, offset + len))
}

fn wrap_range(
    doc: &mut Document,
    range: &Range,
    kind: TagKind,
    attributes: Attributes,
) -> Option<Range> {
    let bounds = range.to_boundaries(doc);
    if bounds.is_collapsed() {
        return Some(range.clone());
    }

    let mut wrapper = Element::with_attributes(kind, attributes);

    // Both ends between children of one container: move the nodes as they are.
    if bounds.start.path == bounds.end.path && !bounds.start.is_in_text(doc) {
        debug!(%kind, "wrapping whole nodes");
        let container = bounds.start.path;
        let children = doc.children_at_mut(&container)?;
        wrapper.children = children
            .drain(bounds.start.offset..bounds.end.offset)
            .collect();
        children.insert(bounds.start.offset, Node::Element(wrapper));
        let mut path = container;
        path.push(bounds.start.offset);
        return Range::select_contents(doc, &path);
    }

    debug!(%kind, "wrapping extracted content");
    let Extracted { nodes, at } = extract_contents(doc, &bounds)?;
    if nodes.is_empty() {
        return insert_nodes(doc, &at, Vec::new());
    }
    wrapper.children = nodes;
    normalize_children(&mut wrapper.children);
    let path = doc.insert(&at.path, at.offset, Node::Element(wrapper))?;
    Range::select_contents(doc, &path)
}

/// Cut the content of `range` out of the document. Text nodes cut at
/// either end are split at the exact offsets; elements cut partway are
/// split into a part that stays and a shell of the same kind that leaves.
/// Shells left empty on either side are dropped.
pub fn extract_contents(doc: &mut Document, range: &Range) -> Option<Extracted> {
    range.validate(doc).ok()?;
    let range = range.to_boundaries(doc);
    let ancestor = range.common_ancestor();

    if matches!(doc.node_at(&ancestor), Some(Node::Text(_))) {
        return extract_from_text(doc, &ancestor, range.start.offset, range.end.offset);
    }

    let start_rel = &range.start.path[ancestor.len()..];
    let end_rel = &range.end.path[ancestor.len()..];
    let children = doc.children_at_mut(&ancestor)?;

    let (first_full, left_shell) = match start_rel.split_first() {
        None => (range.start.offset, None),
        Some((idx, rest)) => {
            let shell = split_off_after(children.get_mut(*idx)?, rest, range.start.offset);
            (idx + 1, Some(shell))
        }
    };
    let (last_full, right_shell) = match end_rel.split_first() {
        None => (range.end.offset, None),
        Some((idx, rest)) => {
            let shell = split_off_before(children.get_mut(*idx)?, rest, range.end.offset);
            (*idx, Some(shell))
        }
    };
    if first_full > last_full || last_full > children.len() {
        return None;
    }

    let middle: Vec<Node> = children.drain(first_full..last_full).collect();

    let mut insert_at = first_full;
    if right_shell.is_some() && children.get(first_full).is_some_and(Node::is_empty) {
        children.remove(first_full);
    }
    if left_shell.is_some() && first_full > 0 && children[first_full - 1].is_empty() {
        children.remove(first_full - 1);
        insert_at -= 1;
    }

    let mut nodes = Vec::with_capacity(middle.len() + 2);
    nodes.extend(left_shell.filter(|node| !node.is_empty()));
    nodes.extend(middle);
    nodes.extend(right_shell.filter(|node| !node.is_empty()));

    Some(Extracted {
        nodes,
        at: Position::new(ancestor, insert_at),
    })
}

/// Both ends inside one text node: cut the middle and leave the two
/// remaining halves as separate siblings around the cut.
fn extract_from_text(
    doc: &mut Document,
    path: &[usize],
    start: usize,
    end: usize,
) -> Option<Extracted> {
    let (index, parent) = path.split_last()?;
    let Some(Node::Text(value)) = doc.node_at_mut(path) else {
        return None;
    };
    let (from, to) = (byte_offset(value, start), byte_offset(value, end));
    let right = value.split_off(to);
    let middle = value.split_off(from);
    let left = std::mem::take(value);

    doc.replace_with(path, vec![Node::Text(left), Node::Text(right)])?;
    Some(Extracted {
        nodes: vec![Node::Text(middle)],
        at: Position::new(parent.to_vec(), index + 1),
    })
}

/// Remove everything after the boundary (`rel`, `offset`) from `node` and
/// return it wrapped in a shell of the same kind.
fn split_off_after(node: &mut Node, rel: &[usize], offset: usize) -> Node {
    match node {
        Node::Text(value) => Node::Text(value.split_off(byte_offset(value, offset))),
        Node::Element(element) if element.kind == TagKind::LineBreak => Node::text(""),
        Node::Element(element) => {
            let mut shell = element.shallow_clone();
            match rel.split_first() {
                None => {
                    let at = offset.min(element.children.len());
                    shell.children = element.children.split_off(at);
                }
                Some((&idx, rest)) if idx < element.children.len() => {
                    let mut tail = element.children.split_off(idx + 1);
                    if let Some(child) = element.children.get_mut(idx) {
                        let inner = split_off_after(child, rest, offset);
                        if child.is_empty() {
                            element.children.remove(idx);
                        }
                        if !inner.is_empty() {
                            tail.insert(0, inner);
                        }
                    }
                    shell.children = tail;
                }
                Some(_) => {}
            }
            Node::Element(shell)
        }
    }
}

/// Remove everything before the boundary (`rel`, `offset`) from `node` and
/// return it wrapped in a shell of the same kind.
fn split_off_before(node: &mut Node, rel: &[usize], offset: usize) -> Node {
    match node {
        Node::Text(value) => {
            let rest = value.split_off(byte_offset(value, offset));
            Node::Text(std::mem::replace(value, rest))
        }
        Node::Element(element) if element.kind == TagKind::LineBreak => Node::text(""),
        Node::Element(element) => {
            let mut shell = element.shallow_clone();
            match rel.split_first() {
                None => {
                    let at = offset.min(element.children.len());
                    shell.children = element.children.drain(..at).collect();
                }
                Some((&idx, rest)) if idx < element.children.len() => {
                    let mut head: Vec<Node> = element.children.drain(..idx).collect();
                    if let Some(child) = element.children.first_mut() {
                        let inner = split_off_before(child, rest, offset);
                        if child.is_empty() {
                            element.children.remove(0);
                        }
                        if !inner.is_empty() {
                            head.push(inner);
                        }
                    }
                    shell.children = head;
                }
                Some(_) => {}
            }
            Node::Element(shell)
        }
    }
}

/// Insert `nodes` at `at`, splitting a text node when `at` falls inside
/// one, and merge text across the seams. Returns the range covering the
/// inserted content (collapsed when `nodes` is empty).
pub fn insert_nodes(doc: &mut Document, at: &Position, mut nodes: Vec<Node>) -> Option<Range> {
    at.validate(doc).ok()?;
    let mut at = at.to_boundary(doc);
    if at.is_in_text(doc) {
        let right = doc.split_text(&at.path, at.offset)?;
        let (index, parent) = right.split_last()?;
        at = Position::new(parent.to_vec(), *index);
    }

    normalize_children(&mut nodes);
    let container = at.path;
    let index = at.offset;
    let count = nodes.len();
    let children = doc.children_at_mut(&container)?;
    children.splice(index..index, nodes);

    let child_path = |idx: usize| {
        let mut path = container.clone();
        path.push(idx);
        path
    };

    if count == 0 {
        if index > 0
            && let Some(left_len) = join_texts(children, index - 1)
        {
            return Some(Range::collapsed(Position::new(child_path(index - 1), left_len)));
        }
        return Some(Range::collapsed(Position::new(container.clone(), index)));
    }

    let last = index + count - 1;
    let mut end = Position::new(container.clone(), index + count);
    if let Some(last_len) = children.get(last).and_then(Node::as_text).map(char_len)
        && join_texts(children, last).is_some()
    {
        end = Position::new(child_path(last), last_len);
    }

    let mut start = Position::new(container.clone(), index);
    if index > 0
        && let Some(left_len) = join_texts(children, index - 1)
    {
        start = Position::new(child_path(index - 1), left_len);
        end = if end.path == child_path(index) {
            Position::new(child_path(index - 1), left_len + end.offset)
        } else if end.path.len() > container.len() {
            let shifted = end.path[container.len()] - 1;
            Position::new(child_path(shifted), end.offset)
        } else {
            Position::new(container.clone(), end.offset - 1)
        };
    }

    Some(Range::new(start, end))
}

/// Merge `children[left + 1]` into `children[left]` when both are text.
/// Returns the char length of the left text before the merge.
fn join_texts(children: &mut Vec<Node>, left: usize) -> Option<usize> {
    if !(children.get(left).is_some_and(Node::is_text)
        && children.get(left + 1).is_some_and(Node::is_text))
    {
        return None;
    }
    let Node::Text(right) = children.remove(left + 1) else {
        return None;
    };
    let Some(Node::Text(value)) = children.get_mut(left) else {
        return None;
    };
    let left_len = char_len(value);
    value.push_str(&right);
    Some(left_len)
}

/// Remove the content of `range` and return the caret where it was.
pub fn delete_contents(doc: &mut Document, range: &Range) -> Option<Position> {
    let Extracted { at, .. } = extract_contents(doc, range)?;
    insert_nodes(doc, &at, Vec::new()).map(|caret| caret.start)
}

/// Text content covered by `range`
pub fn text_in_range(doc: &Document, range: &Range) -> String {
    let mut scratch = doc.clone();
    let Some(extracted) = extract_contents(&mut scratch, range) else {
        return String::new();
    };
    let mut out = String::new();
    for node in &extracted.nodes {
        node.push_text_content(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(children: Vec<Node>) -> Node {
        Node::element(TagKind::Bold, children)
    }

    fn toggle(doc: &mut Document, range: &Range, kind: TagKind) -> Range {
        toggle_format(doc, range, kind, Attributes::new())
    }

    #[test]
    fn test_wrap_prefix_of_text() {
        let mut doc = Document::with_text("hello world");
        let range = toggle(&mut doc, &Range::in_text(vec![0], 0, 5), TagKind::Bold);

        assert_eq!(
            doc.children(),
            &[bold(vec![Node::text("hello")]), Node::text(" world")]
        );
        assert_eq!(range, Range::select_contents(&doc, &[0]).unwrap());
    }

    #[test]
    fn test_wrap_middle_of_text() {
        let mut doc = Document::with_text("hello world");
        toggle(&mut doc, &Range::in_text(vec![0], 3, 8), TagKind::Italic);

        assert_eq!(
            doc.children(),
            &[
                Node::text("hel"),
                Node::element(TagKind::Italic, vec![Node::text("lo wo")]),
                Node::text("rld"),
            ]
        );
    }

    #[test]
    fn test_toggle_twice_restores_document() {
        let original = Document::with_text("hello world");
        let mut doc = original.clone();
        let range = toggle(&mut doc, &Range::in_text(vec![0], 6, 11), TagKind::Underline);
        let range = toggle(&mut doc, &range, TagKind::Underline);

        assert_eq!(doc, original);
        assert_eq!(range, Range::in_text(vec![0], 6, 11));
    }

    #[test]
    fn test_wrap_across_element_boundary() {
        let mut doc = Document::from_nodes(vec![
            Node::text("one "),
            bold(vec![Node::text("two")]),
            Node::text(" three"),
        ]);
        let range = Range::new(Position::new(vec![0], 2), Position::new(vec![1, 0], 1));
        let result = toggle(&mut doc, &range, TagKind::Italic);

        assert_eq!(
            doc.children(),
            &[
                Node::text("on"),
                Node::element(
                    TagKind::Italic,
                    vec![Node::text("e "), bold(vec![Node::text("t")])]
                ),
                bold(vec![Node::text("wo")]),
                Node::text(" three"),
            ]
        );
        assert_eq!(text_in_range(&doc, &result), "e t");
        assert_eq!(doc.text_content(), "one two three");
    }

    #[test]
    fn test_selection_covering_whole_element_drops_empty_shells() {
        let mut doc = Document::from_nodes(vec![
            Node::text("a"),
            bold(vec![Node::text("bc")]),
            Node::text("d"),
        ]);
        let range = Range::new(Position::new(vec![1, 0], 0), Position::new(vec![2], 1));
        toggle(&mut doc, &range, TagKind::Strikethrough);

        assert_eq!(
            doc.children(),
            &[
                Node::text("a"),
                Node::element(
                    TagKind::Strikethrough,
                    vec![bold(vec![Node::text("bc")]), Node::text("d")]
                ),
            ]
        );
    }

    #[test]
    fn test_code_keeps_line_break() {
        let mut doc = Document::from_nodes(vec![
            Node::text("a"),
            Node::line_break(),
            Node::text("b"),
        ]);
        let range = Range::whole_document(&doc);
        toggle(&mut doc, &range, TagKind::Code);

        assert_eq!(
            doc.children(),
            &[Node::element(
                TagKind::Code,
                vec![Node::text("a"), Node::line_break(), Node::text("b")]
            )]
        );
    }

    #[test]
    fn test_collapsed_range_is_noop() {
        let original = Document::with_text("hello");
        for kind in TagKind::ALL {
            let mut doc = original.clone();
            let range = Range::in_text(vec![0], 2, 2);
            assert_eq!(toggle(&mut doc, &range, kind), range);
            assert_eq!(doc, original);
        }
    }

    #[test]
    fn test_invalid_range_is_noop() {
        let original = Document::with_text("hello");
        let mut doc = original.clone();
        let stale = Range::in_text(vec![3, 1], 0, 2);
        assert_eq!(toggle(&mut doc, &stale, TagKind::Bold), stale);
        let reversed = Range::in_text(vec![0], 4, 1);
        assert_eq!(toggle(&mut doc, &reversed, TagKind::Bold), reversed);
        assert_eq!(doc, original);
    }

    #[test]
    fn test_structural_kinds_are_not_toggled() {
        let original = Document::with_text("hello");
        let mut doc = original.clone();
        toggle(&mut doc, &Range::in_text(vec![0], 0, 5), TagKind::Paragraph);
        toggle(&mut doc, &Range::in_text(vec![0], 0, 5), TagKind::LineBreak);
        assert_eq!(doc, original);
    }

    #[test]
    fn test_partial_selection_unwraps_whole_element() {
        let mut doc = Document::from_nodes(vec![
            Node::text("x "),
            bold(vec![Node::text("hello")]),
            Node::text(" y"),
        ]);
        let range = toggle(&mut doc, &Range::in_text(vec![1, 0], 1, 3), TagKind::Bold);

        assert_eq!(doc.children(), &[Node::text("x hello y")]);
        assert_eq!(range, Range::in_text(vec![0], 2, 7));
    }

    #[test]
    fn test_unwrap_flattens_nested_formatting() {
        let mut doc = Document::from_nodes(vec![Node::element(
            TagKind::Blockquote,
            vec![
                Node::text("a"),
                Node::element(TagKind::Italic, vec![Node::text("b")]),
                Node::line_break(),
                Node::text("c"),
            ],
        )]);
        toggle(&mut doc, &Range::in_text(vec![0, 1, 0], 0, 1), TagKind::Blockquote);
        assert_eq!(doc.children(), &[Node::text("abc")]);
    }

    #[test]
    fn test_nested_same_kind_unwraps_innermost() {
        let mut doc = Document::from_nodes(vec![bold(vec![
            Node::text("a"),
            bold(vec![Node::text("b")]),
        ])]);
        toggle(&mut doc, &Range::in_text(vec![0, 1, 0], 0, 1), TagKind::Bold);
        assert_eq!(doc.children(), &[bold(vec![Node::text("ab")])]);
    }

    #[test]
    fn test_spoiler_only_matches_spoiler() {
        let mut doc = Document::from_nodes(vec![bold(vec![Node::text("secret")])]);
        toggle(&mut doc, &Range::in_text(vec![0, 0], 0, 6), TagKind::Spoiler);
        assert_eq!(
            doc.children(),
            &[bold(vec![Node::element(
                TagKind::Spoiler,
                vec![Node::text("secret")]
            )])]
        );
    }

    #[test]
    fn test_link_carries_href() {
        let mut doc = Document::with_text("see docs");
        let mut attrs = Attributes::new();
        attrs.insert("href".to_string(), "https://example.com".to_string());
        attrs.insert("target".to_string(), "_blank".to_string());
        toggle_format(&mut doc, &Range::in_text(vec![0], 4, 8), TagKind::Link, attrs);

        assert_eq!(
            doc.children(),
            &[
                Node::text("see "),
                Node::Element(Element::link("https://example.com", vec![Node::text("docs")])),
            ]
        );
    }

    #[test]
    fn test_insert_nodes_merges_text_seams() {
        let mut doc = Document::with_text("hello");
        let range = insert_nodes(
            &mut doc,
            &Position::new(vec![0], 2),
            vec![Node::text("XY")],
        )
        .unwrap();
        assert_eq!(doc.children(), &[Node::text("heXYllo")]);
        assert_eq!(range, Range::in_text(vec![0], 2, 4));
    }

    #[test]
    fn test_insert_nodes_with_elements() {
        let mut doc = Document::with_text("hello");
        let range = insert_nodes(
            &mut doc,
            &Position::new(vec![0], 2),
            vec![Node::text("<"), Node::line_break(), Node::text(">")],
        )
        .unwrap();
        assert_eq!(
            doc.children(),
            &[Node::text("he<"), Node::line_break(), Node::text(">llo")]
        );
        assert_eq!(range.start, Position::new(vec![0], 2));
        assert_eq!(range.end, Position::new(vec![2], 1));
        assert_eq!(text_in_range(&doc, &range), "<>");
    }

    #[test]
    fn test_delete_contents_rejoins_text() {
        let mut doc = Document::from_nodes(vec![
            Node::text("one "),
            bold(vec![Node::text("two")]),
            Node::text(" three"),
        ]);
        let range = Range::new(Position::new(vec![0], 2), Position::new(vec![2], 3));
        let caret = delete_contents(&mut doc, &range).unwrap();
        assert_eq!(doc.children(), &[Node::text("onree")]);
        assert_eq!(caret, Position::new(vec![0], 2));
    }
}
