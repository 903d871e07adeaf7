// Formatter session
// Owns one document and the current selection, and routes formatting,
// typing, paste and export requests to the engine, sanitizer and serializers.

use tracing::{debug, info};

use crate::export::{Export, ExportFormat};
use crate::richtext::document_tree::{Attributes, Document, Element, HREF, Node, TagKind};
use crate::richtext::formatting::{delete_contents, insert_nodes, toggle_format};
use crate::richtext::html_import::sanitize_html;
use crate::richtext::range::{Position, Range, RangeError};
use crate::richtext::sanitizer::Sanitizer;

/// What the clipboard offered on paste
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardPayload {
    pub fn html(html: impl Into<String>) -> Self {
        ClipboardPayload {
            html: Some(html.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ClipboardPayload {
            html: None,
            text: Some(text.into()),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// Plain text as text nodes separated by line breaks
pub fn text_to_nodes(text: &str) -> Vec<Node> {
    let text = text.replace("\r\n", "\n");
    let mut nodes = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            nodes.push(Node::line_break());
        }
        if !line.is_empty() {
            nodes.push(Node::text(line));
        }
    }
    nodes
}

#[derive(Debug, Clone, Default)]
pub struct FormatterSession {
    document: Document,
    selection: Option<Range>,
    sanitizer: Sanitizer,
}

impl FormatterSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitizer(sanitizer: Sanitizer) -> Self {
        FormatterSession {
            sanitizer,
            ..Self::default()
        }
    }

    pub fn from_document(document: Document) -> Self {
        FormatterSession {
            document,
            ..Self::default()
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, range: Range) -> Result<(), RangeError> {
        range.validate(&self.document)?;
        self.selection = Some(range);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn select_all(&mut self) {
        self.selection = Some(Range::whole_document(&self.document));
    }

    /// True when the document holds no visible text
    pub fn is_blank(&self) -> bool {
        self.document.is_blank()
    }

    /// Toggle `kind` over the selection. Without a selection nothing happens.
    pub fn toggle(&mut self, kind: TagKind) {
        self.toggle_with(kind, Attributes::new());
    }

    pub fn toggle_link(&mut self, href: &str) {
        let href = href.trim();
        if href.is_empty() {
            debug!("ignoring link without a target");
            return;
        }
        let mut attributes = Attributes::new();
        attributes.insert(HREF.to_string(), href.to_string());
        self.toggle_with(TagKind::Link, attributes);
    }

    fn toggle_with(&mut self, kind: TagKind, attributes: Attributes) {
        let Some(range) = &self.selection else {
            debug!(%kind, "toggle without a selection");
            return;
        };
        let next = toggle_format(&mut self.document, range, kind, attributes);
        self.selection = Some(next);
    }

    /// Replace the selection with plain text. `\n` becomes a line break.
    pub fn insert_text(&mut self, text: &str) {
        self.insert_fragment(text_to_nodes(text));
    }

    /// Insert clipboard content: sanitized HTML when offered, otherwise plain
    /// text. Blank payloads change nothing.
    pub fn paste(&mut self, payload: &ClipboardPayload) {
        if self.document.is_blank() {
            self.document.clear();
            self.selection = Some(Range::collapsed(Position::root(0)));
        }

        if let Some(html) = non_blank(&payload.html) {
            let nodes = sanitize_html(html, &self.sanitizer);
            debug!(nodes = nodes.len(), "pasting sanitized html");
            self.insert_fragment(nodes);
        } else if let Some(text) = non_blank(&payload.text) {
            debug!(chars = text.chars().count(), "pasting plain text");
            self.insert_text(text);
        } else {
            debug!("ignoring blank clipboard payload");
        }
    }

    /// Put `nodes` where the selection is, leaving a caret after them.
    /// Without a usable selection the nodes are appended.
    fn insert_fragment(&mut self, nodes: Vec<Node>) {
        let at = match self.selection.take() {
            Some(range) if range.validate(&self.document).is_ok() => {
                if range.is_collapsed() {
                    range.start
                } else {
                    delete_contents(&mut self.document, &range)
                        .unwrap_or_else(|| Position::root(self.document.children().len()))
                }
            }
            _ => Position::root(self.document.children().len()),
        };

        let inserted = insert_nodes(&mut self.document, &at, nodes)
            .or_else(|| {
                let end = Position::root(self.document.children().len());
                insert_nodes(&mut self.document, &end, Vec::new())
            })
            .map(|range| Range::collapsed(range.end));
        self.selection = inserted;
    }

    /// Drop all formatting but keep the line structure
    pub fn clear_formatting(&mut self) {
        let mut flat = String::new();
        flatten_lines(self.document.children(), &mut flat);

        let lines: Vec<&str> = flat.split('\n').collect();
        let mut nodes = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if index == 0 || !line.trim().is_empty() {
                nodes.push(Node::text(*line));
            }
            if index + 1 < lines.len() {
                nodes.push(Node::line_break());
            }
        }

        self.document.set_children(nodes);
        self.selection = None;
        info!(lines = lines.len(), "formatting cleared");
    }

    /// Empty the document
    pub fn clear_all(&mut self) {
        self.document.clear();
        self.selection = None;
        info!("document cleared");
    }

    /// Serialize a snapshot of the document
    pub fn export(&self, format: ExportFormat) -> Export {
        let snapshot = self.document.clone();
        Export {
            format,
            text: format.export(&snapshot),
        }
    }
}

/// Text content where every block container and line break ends a line
fn flatten_lines(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(value) => out.push_str(value),
            Node::Element(Element { kind, children, .. }) => {
                flatten_lines(children, out);
                if matches!(
                    kind,
                    TagKind::Paragraph | TagKind::Blockquote | TagKind::LineBreak
                ) {
                    out.push('\n');
                }
            }
        }
    }
}
