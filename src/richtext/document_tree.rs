// Document Tree
// An ordered tree of text and formatting elements over a closed tag vocabulary.
// The document owns every node; positions refer to nodes by child-index paths.

use std::collections::BTreeMap;
use std::fmt;

/// Child indices leading from the document root to a node. The root is `[]`.
pub type NodePath = Vec<usize>;

/// Element attributes. Only `href` on links survives construction.
pub type Attributes = BTreeMap<String, String>;

/// Attribute name carrying a link destination
pub const HREF: &str = "href";

/// The canonical tag vocabulary shared by the sanitizer, the formatting
/// engine and every serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Spoiler,
    Link,
    Blockquote,
    Paragraph,
    LineBreak,
}

impl TagKind {
    pub const ALL: [TagKind; 10] = [
        TagKind::Bold,
        TagKind::Italic,
        TagKind::Underline,
        TagKind::Strikethrough,
        TagKind::Code,
        TagKind::Spoiler,
        TagKind::Link,
        TagKind::Blockquote,
        TagKind::Paragraph,
        TagKind::LineBreak,
    ];

    /// Kinds a caller may toggle over a selection
    pub fn is_toggleable(self) -> bool {
        !matches!(self, TagKind::Paragraph | TagKind::LineBreak)
    }

    pub fn name(self) -> &'static str {
        match self {
            TagKind::Bold => "bold",
            TagKind::Italic => "italic",
            TagKind::Underline => "underline",
            TagKind::Strikethrough => "strikethrough",
            TagKind::Code => "code",
            TagKind::Spoiler => "spoiler",
            TagKind::Link => "link",
            TagKind::Blockquote => "blockquote",
            TagKind::Paragraph => "paragraph",
            TagKind::LineBreak => "line-break",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A formatting or structural container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: TagKind,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: TagKind) -> Self {
        Element {
            kind,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Build an element, keeping only the attributes its kind may carry.
    pub fn with_attributes(kind: TagKind, attributes: Attributes) -> Self {
        let mut element = Element::new(kind);
        if kind == TagKind::Link
            && let Some(href) = attributes.get(HREF)
        {
            element.attributes.insert(HREF.to_string(), href.clone());
        }
        element
    }

    pub fn with_children(kind: TagKind, children: Vec<Node>) -> Self {
        let mut element = Element::new(kind);
        if kind != TagKind::LineBreak {
            element.children = children;
        }
        element
    }

    pub fn link(href: impl Into<String>, children: Vec<Node>) -> Self {
        let mut element = Element::with_children(TagKind::Link, children);
        element.attributes.insert(HREF.to_string(), href.into());
        element
    }

    /// Link destination; `None` for every other kind and for links pasted without one
    pub fn href(&self) -> Option<&str> {
        if self.kind == TagKind::Link {
            self.attributes.get(HREF).map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_spoiler(&self) -> bool {
        self.kind == TagKind::Spoiler
    }

    /// Concatenated text of all descendant text nodes. Line breaks contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }

    /// Same element with no children
    pub fn shallow_clone(&self) -> Element {
        Element {
            kind: self.kind,
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }
}

/// A document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn element(kind: TagKind, children: Vec<Node>) -> Self {
        Node::Element(Element::with_children(kind, children))
    }

    pub fn line_break() -> Self {
        Node::Element(Element::new(TagKind::LineBreak))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(value) => Some(value),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn kind(&self) -> Option<TagKind> {
        self.as_element().map(|element| element.kind)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text_content(&mut out);
        out
    }

    pub fn push_text_content(&self, out: &mut String) {
        match self {
            Node::Text(value) => out.push_str(value),
            Node::Element(element) => {
                for child in &element.children {
                    child.push_text_content(out);
                }
            }
        }
    }

    /// Number of valid offsets minus one: chars for text, children for elements
    pub fn boundary_len(&self) -> usize {
        match self {
            Node::Text(value) => char_len(value),
            Node::Element(element) => element.children.len(),
        }
    }

    /// Empty text, or an element other than a line break with nothing inside
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Text(value) => value.is_empty(),
            Node::Element(element) => {
                element.kind != TagKind::LineBreak && element.children.is_empty()
            }
        }
    }

    fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Element(element) => Some(&element.children),
            Node::Text(_) => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(element) if element.kind != TagKind::LineBreak => {
                Some(&mut element.children)
            }
            _ => None,
        }
    }
}

/// Number of chars in `s`; text offsets are always counted in chars
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the char at `offset`, or `s.len()` past the end
pub fn byte_offset(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

/// Drop empty text nodes and merge adjacent text siblings, recursively.
pub fn normalize_children(children: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for mut node in children.drain(..) {
        if let Node::Element(element) = &mut node {
            normalize_children(&mut element.children);
        }
        if let Node::Text(value) = &node {
            if value.is_empty() {
                continue;
            }
            if let Some(Node::Text(previous)) = merged.last_mut() {
                previous.push_str(value);
                continue;
            }
        }
        merged.push(node);
    }
    *children = merged;
}

/// Merge the text node at `index` with any text siblings directly around it.
/// Returns the merged node's index and the char offset at which the original
/// text starts inside it. Non-text nodes at `index` are left alone.
pub fn merge_text_neighbors(children: &mut Vec<Node>, index: usize) -> (usize, usize) {
    if !matches!(children.get(index), Some(Node::Text(_))) {
        return (index, 0);
    }

    let mut first = index;
    while first > 0 && children[first - 1].is_text() {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < children.len() && children[last + 1].is_text() {
        last += 1;
    }

    let mut offset = 0;
    let mut merged = String::new();
    for (idx, node) in children.drain(first..=last).enumerate() {
        if let Node::Text(value) = node {
            if first + idx == index {
                offset = char_len(&merged);
            }
            merged.push_str(&value);
        }
    }
    children.insert(first, Node::Text(merged));
    (first, offset)
}

/// The document: a single root container that is never wrapped or removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    children: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            children: Vec::new(),
        }
    }

    /// Build a document from nodes, coalescing adjacent text
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut doc = Document { children: nodes };
        doc.normalize();
        doc
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::from_nodes(vec![Node::text(text)])
    }

    /// Top-level nodes
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the document holds no non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.text_content().trim().is_empty()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Replace the whole content
    pub fn set_children(&mut self, nodes: Vec<Node>) {
        self.children = nodes;
        self.normalize();
    }

    pub fn normalize(&mut self) {
        normalize_children(&mut self.children);
    }

    /// Resolve a non-root path
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for idx in rest {
            node = node.children()?.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for idx in rest {
            node = node.children_mut()?.get_mut(*idx)?;
        }
        Some(node)
    }

    /// Child list of the container at `path`; the root for `[]`
    pub fn children_at(&self, path: &[usize]) -> Option<&Vec<Node>> {
        if path.is_empty() {
            return Some(&self.children);
        }
        self.node_at(path)?.children()
    }

    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.children);
        }
        self.node_at_mut(path)?.children_mut()
    }

    /// Largest valid offset for a position in the node at `path`
    pub fn boundary_len(&self, path: &[usize]) -> Option<usize> {
        if path.is_empty() {
            return Some(self.children.len());
        }
        self.node_at(path).map(Node::boundary_len)
    }

    /// Insert `node` as child `index` of the container at `parent`.
    pub fn insert(&mut self, parent: &[usize], index: usize, node: Node) -> Option<NodePath> {
        let children = self.children_at_mut(parent)?;
        if index > children.len() {
            return None;
        }
        children.insert(index, node);
        let mut path = parent.to_vec();
        path.push(index);
        Some(path)
    }

    /// Detach and return the node at `path`. The root cannot be removed.
    pub fn remove(&mut self, path: &[usize]) -> Option<Node> {
        let (last, parent) = path.split_last()?;
        let children = self.children_at_mut(parent)?;
        if *last >= children.len() {
            return None;
        }
        Some(children.remove(*last))
    }

    /// Replace the node at `path` with `nodes`, returning the replaced node.
    pub fn replace_with(&mut self, path: &[usize], nodes: Vec<Node>) -> Option<Node> {
        let (last, parent) = path.split_last()?;
        let children = self.children_at_mut(parent)?;
        if *last >= children.len() {
            return None;
        }
        let removed = children.splice(*last..*last + 1, nodes).next();
        removed
    }

    /// Split the text node at `path` at a char offset. The left half keeps
    /// the path; the right half is inserted after it and its path returned.
    pub fn split_text(&mut self, path: &[usize], offset: usize) -> Option<NodePath> {
        let (last, parent) = path.split_last()?;
        let children = self.children_at_mut(parent)?;
        let Some(Node::Text(value)) = children.get_mut(*last) else {
            return None;
        };
        if offset > char_len(value) {
            return None;
        }
        let right = value.split_off(byte_offset(value, offset));
        children.insert(last + 1, Node::Text(right));
        let mut right_path = parent.to_vec();
        right_path.push(last + 1);
        Some(right_path)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
            write!(f, "{}", "  ".repeat(depth))?;
            match node {
                Node::Text(value) => writeln!(f, "{:?}", value),
                Node::Element(element) => {
                    match element.href() {
                        Some(href) => writeln!(f, "{}({:?})", element.kind, href)?,
                        None => writeln!(f, "{}", element.kind)?,
                    }
                    for child in &element.children {
                        write_node(f, child, depth + 1)?;
                    }
                    Ok(())
                }
            }
        }

        writeln!(f, "Document ({} nodes):", self.children.len())?;
        for child in &self.children {
            write_node(f, child, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_nodes(vec![
            Node::element(TagKind::Bold, vec![Node::text("hello")]),
            Node::text(" world"),
            Node::element(
                TagKind::Paragraph,
                vec![Node::text("a"), Node::line_break(), Node::text("b")],
            ),
        ])
    }

    #[test]
    fn test_node_lookup() {
        let doc = sample();
        assert_eq!(doc.node_at(&[0, 0]).and_then(Node::as_text), Some("hello"));
        assert_eq!(doc.node_at(&[2, 1]).and_then(Node::kind), Some(TagKind::LineBreak));
        assert!(doc.node_at(&[]).is_none());
        assert!(doc.node_at(&[1, 0]).is_none());
        assert_eq!(doc.children_at(&[]).map(Vec::len), Some(3));
        assert!(doc.children_at(&[1]).is_none());
    }

    #[test]
    fn test_text_content_skips_line_breaks() {
        let doc = sample();
        assert_eq!(doc.text_content(), "hello worldab");
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let doc = Document::from_nodes(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            Node::element(TagKind::Italic, vec![Node::text("c"), Node::text("d")]),
        ]);
        assert_eq!(
            doc.children(),
            &[
                Node::text("ab"),
                Node::element(TagKind::Italic, vec![Node::text("cd")]),
            ]
        );
    }

    #[test]
    fn test_split_text_by_chars() {
        let mut doc = Document::with_text("привет");
        let right = doc.split_text(&[0], 2).unwrap();
        assert_eq!(right, vec![1]);
        assert_eq!(doc.children(), &[Node::text("пр"), Node::text("ивет")]);
        assert!(doc.split_text(&[0], 10).is_none());
    }

    #[test]
    fn test_insert_remove_replace() {
        let mut doc = sample();
        assert!(doc.insert(&[2, 1], 0, Node::text("x")).is_none());
        let path = doc.insert(&[2], 3, Node::text("!")).unwrap();
        assert_eq!(path, vec![2, 3]);

        let removed = doc.remove(&[0]).unwrap();
        assert_eq!(removed.text_content(), "hello");
        assert!(doc.remove(&[]).is_none());

        let replaced = doc.replace_with(&[0], vec![Node::text("x"), Node::text("y")]);
        assert_eq!(replaced, Some(Node::text(" world")));
        assert_eq!(doc.children().len(), 3);
    }

    #[test]
    fn test_merge_text_neighbors_reports_offset() {
        let mut children = vec![
            Node::line_break(),
            Node::text("ab"),
            Node::text("cd"),
            Node::text("e"),
        ];
        let (index, offset) = merge_text_neighbors(&mut children, 2);
        assert_eq!(index, 1);
        assert_eq!(offset, 2);
        assert_eq!(children, vec![Node::line_break(), Node::text("abcde")]);
    }

    #[test]
    fn test_href_only_on_links() {
        let mut attrs = Attributes::new();
        attrs.insert(HREF.to_string(), "https://example.com".to_string());
        attrs.insert("class".to_string(), "x".to_string());

        let link = Element::with_attributes(TagKind::Link, attrs.clone());
        assert_eq!(link.href(), Some("https://example.com"));
        assert_eq!(link.attributes.len(), 1);

        let bold = Element::with_attributes(TagKind::Bold, attrs);
        assert!(bold.attributes.is_empty());
        assert_eq!(bold.href(), None);
    }

    #[test]
    fn test_line_break_has_no_children() {
        let node = Node::element(TagKind::LineBreak, vec![Node::text("x")]);
        assert_eq!(node, Node::line_break());
        assert!(!node.is_empty());
    }
}
