// Sanitizer
// Maps an externally supplied markup tree onto the canonical tag vocabulary.
// Unknown elements are unwrapped rather than deleted so their text survives,
// style-only formatting is promoted to real tags, and every attribute except
// a link's href is dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::document_tree::{Element, HREF, Node, TagKind, normalize_children};

/// Class written on exported and re-imported spoiler spans
pub const SPOILER_CLASS: &str = "tg-spoiler";

/// A node of foreign markup, as produced by an HTML parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    /// Comments, doctypes and processing instructions
    Other,
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        MarkupNode::Text(value.into())
    }

    pub fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            children,
        }
    }

    /// Attribute value by case-insensitive name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            MarkupNode::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn text_content(&self) -> String {
        fn collect(node: &MarkupNode, out: &mut String) {
            match node {
                MarkupNode::Text(value) => out.push_str(value),
                MarkupNode::Element { children, .. } => {
                    for child in children {
                        collect(child, out);
                    }
                }
                MarkupNode::Other => {}
            }
        }

        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

impl From<&Node> for MarkupNode {
    /// Render a canonical node back into markup, the way the HTML export writes it
    fn from(node: &Node) -> Self {
        let element = match node {
            Node::Text(value) => return MarkupNode::Text(value.clone()),
            Node::Element(element) => element,
        };
        let children = element.children.iter().map(MarkupNode::from).collect();
        let (tag, attributes) = match element.kind {
            TagKind::Bold => ("b", Vec::new()),
            TagKind::Italic => ("i", Vec::new()),
            TagKind::Underline => ("u", Vec::new()),
            TagKind::Strikethrough => ("s", Vec::new()),
            TagKind::Code => ("code", Vec::new()),
            TagKind::Spoiler => ("span", vec![("class".to_string(), SPOILER_CLASS.to_string())]),
            TagKind::Link => (
                "a",
                element
                    .href()
                    .map(|href| vec![(HREF.to_string(), href.to_string())])
                    .unwrap_or_default(),
            ),
            TagKind::Blockquote => ("blockquote", Vec::new()),
            TagKind::Paragraph => ("p", Vec::new()),
            TagKind::LineBreak => ("br", Vec::new()),
        };
        MarkupNode::Element {
            tag: tag.to_string(),
            attributes,
            children,
        }
    }
}

/// What marks a pasted node as a spoiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerOptions {
    /// Class tokens that mark a spoiler, besides the exported `tg-spoiler`
    pub spoiler_classes: Vec<String>,
    /// Substrings of an inline style that mark a spoiler
    pub spoiler_style_keywords: Vec<String>,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        SanitizerOptions {
            spoiler_classes: vec!["spoiler".to_string(), SPOILER_CLASS.to_string()],
            spoiler_style_keywords: vec!["spoiler".to_string()],
        }
    }
}

/// Formatting declared through an inline `style` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StyleFlags {
    bold: bool,
    normal_weight: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
}

impl StyleFlags {
    fn parse(style: &str) -> Self {
        let mut flags = StyleFlags::default();
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();

            match property.as_str() {
                "font-weight" => match value {
                    "bold" | "bolder" => flags.bold = true,
                    "normal" | "lighter" => flags.normal_weight = true,
                    numeric => match numeric.parse::<u16>() {
                        Ok(weight) if weight >= 600 => flags.bold = true,
                        Ok(_) => flags.normal_weight = true,
                        Err(_) => {}
                    },
                },
                "font-style" => {
                    if value.starts_with("italic") || value.starts_with("oblique") {
                        flags.italic = true;
                    }
                }
                "text-decoration" | "text-decoration-line" => {
                    if value.contains("underline") {
                        flags.underline = true;
                    }
                    if value.contains("line-through") {
                        flags.strikethrough = true;
                    }
                }
                _ => {}
            }
        }
        flags
    }

    /// Promoted kinds, outermost first
    fn kinds(&self) -> Vec<TagKind> {
        let mut kinds = Vec::new();
        if self.bold {
            kinds.push(TagKind::Bold);
        }
        if self.italic {
            kinds.push(TagKind::Italic);
        }
        if self.underline {
            kinds.push(TagKind::Underline);
        }
        if self.strikethrough {
            kinds.push(TagKind::Strikethrough);
        }
        kinds
    }
}

/// Canonical kind for a lowercase tag name, before any class or style is considered
fn kind_for_tag(tag: &str) -> Option<TagKind> {
    match tag {
        "b" | "strong" => Some(TagKind::Bold),
        "i" | "em" => Some(TagKind::Italic),
        "u" | "ins" => Some(TagKind::Underline),
        "s" | "del" | "strike" => Some(TagKind::Strikethrough),
        "code" | "tt" | "kbd" | "samp" => Some(TagKind::Code),
        "tg-spoiler" => Some(TagKind::Spoiler),
        "a" => Some(TagKind::Link),
        "blockquote" => Some(TagKind::Blockquote),
        "p" | "div" => Some(TagKind::Paragraph),
        "br" => Some(TagKind::LineBreak),
        _ => None,
    }
}

/// Whitelist normalizer for pasted markup
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    options: SanitizerOptions,
}

impl Sanitizer {
    pub fn new(options: SanitizerOptions) -> Self {
        Sanitizer { options }
    }

    pub fn options(&self) -> &SanitizerOptions {
        &self.options
    }

    /// Convert foreign markup into a canonical fragment. Never fails; markup
    /// it cannot represent degrades to its text.
    pub fn sanitize(&self, nodes: &[MarkupNode]) -> Vec<Node> {
        let mut out = Vec::new();
        for node in nodes {
            self.sanitize_node(node, &mut out);
        }
        normalize_children(&mut out);
        out
    }

    fn sanitize_node(&self, node: &MarkupNode, out: &mut Vec<Node>) {
        let (tag, children) = match node {
            MarkupNode::Text(value) => {
                out.push(Node::text(value.as_str()));
                return;
            }
            MarkupNode::Other => return,
            MarkupNode::Element { tag, children, .. } => (tag.to_ascii_lowercase(), children),
        };

        match tag.as_str() {
            "br" => {
                out.push(Node::line_break());
                return;
            }
            "pre" => {
                let text = node.text_content();
                if !text.is_empty() {
                    out.push(Node::element(TagKind::Code, vec![Node::Text(text)]));
                }
                return;
            }
            _ => {}
        }

        let style = node.attribute("style").unwrap_or_default();
        let flags = StyleFlags::parse(style);
        let mut base = kind_for_tag(&tag);
        if base == Some(TagKind::Bold) && flags.normal_weight && !flags.bold {
            debug!(%tag, "dropping bold element with a normal font weight");
            base = None;
        }

        let mut layers = Vec::new();
        if base != Some(TagKind::Spoiler) && self.is_spoiler_marked(node, style) {
            layers.push(TagKind::Spoiler);
        }
        layers.extend(flags.kinds().into_iter().filter(|kind| Some(*kind) != base));

        let mut inner = Vec::new();
        for child in children {
            self.sanitize_node(child, &mut inner);
        }
        for kind in layers.iter().rev() {
            inner = vec![Node::element(*kind, inner)];
        }

        match base {
            Some(kind) => {
                let mut element = Element::with_children(kind, inner);
                if kind == TagKind::Link
                    && let Some(href) = node.attribute(HREF)
                {
                    element.attributes.insert(HREF.to_string(), href.to_string());
                }
                out.push(Node::Element(element));
            }
            None => {
                if layers.is_empty() {
                    debug!(%tag, "unwrapping unsupported element");
                }
                out.extend(inner);
            }
        }
    }

    fn is_spoiler_marked(&self, node: &MarkupNode, style: &str) -> bool {
        let by_class = node.attribute("class").is_some_and(|classes| {
            classes.split_whitespace().any(|token| {
                token.eq_ignore_ascii_case(SPOILER_CLASS)
                    || self
                        .options
                        .spoiler_classes
                        .iter()
                        .any(|marker| marker.eq_ignore_ascii_case(token))
            })
        });
        let style = style.to_ascii_lowercase();
        let by_style = self
            .options
            .spoiler_style_keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && style.contains(&keyword.to_ascii_lowercase()));
        by_class || by_style
    }
}

/// Sanitize with the default spoiler markers
pub fn sanitize(nodes: &[MarkupNode]) -> Vec<Node> {
    Sanitizer::default().sanitize(nodes)
}
