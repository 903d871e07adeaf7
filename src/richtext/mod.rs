pub mod document_tree;
pub mod formatting;
pub mod html_import;
pub mod range;
pub mod sanitizer;

pub use document_tree::{Document, Element, Node, NodePath, TagKind};
pub use range::{Position, Range, RangeError};
