// Ranges
// Boundary points inside a Document and ordered pairs of them. A range holds
// paths, not references, so it goes stale when the nodes it names move; every
// mutating operation hands back a fresh range.

use std::cmp::Ordering;

use thiserror::Error;

use super::document_tree::{Document, Node, NodePath, TagKind};

/// Why a range cannot be used against a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("path {0:?} does not resolve in the document")]
    UnresolvedPath(NodePath),
    #[error("offset {offset} is past the end ({len}) of node {path:?}")]
    OffsetOutOfBounds {
        path: NodePath,
        offset: usize,
        len: usize,
    },
    #[error("range end precedes its start")]
    Reversed,
}

/// A boundary point: for a text node the offset counts chars, for an
/// element (or the root, `[]`) it counts children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub path: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Position { path, offset }
    }

    /// Position between top-level nodes
    pub fn root(offset: usize) -> Self {
        Position::new(Vec::new(), offset)
    }

    /// Document-order key: the path followed by the offset
    pub fn order_key(&self) -> Vec<usize> {
        let mut key = self.path.clone();
        key.push(self.offset);
        key
    }

    pub fn validate(&self, doc: &Document) -> Result<(), RangeError> {
        let len = doc
            .boundary_len(&self.path)
            .ok_or_else(|| RangeError::UnresolvedPath(self.path.clone()))?;
        if self.offset > len {
            return Err(RangeError::OffsetOutOfBounds {
                path: self.path.clone(),
                offset: self.offset,
                len,
            });
        }
        Ok(())
    }

    pub fn is_in_text(&self, doc: &Document) -> bool {
        matches!(doc.node_at(&self.path), Some(Node::Text(_)))
    }

    /// Equivalent position that does not sit on the edge of a text node:
    /// text offset 0 becomes "before the node" in its parent, the end
    /// offset becomes "after the node".
    /// Positions inside a line break resolve to just before it.
    pub fn to_boundary(&self, doc: &Document) -> Position {
        let Some((index, parent)) = self.path.split_last() else {
            return self.clone();
        };
        let value = match doc.node_at(&self.path) {
            Some(Node::Text(value)) => value,
            Some(Node::Element(element)) if element.kind == TagKind::LineBreak => {
                return Position::new(parent.to_vec(), *index);
            }
            _ => return self.clone(),
        };
        if self.offset == 0 {
            Position::new(parent.to_vec(), *index)
        } else if self.offset >= value.chars().count() {
            Position::new(parent.to_vec(), index + 1)
        } else {
            self.clone()
        }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An ordered pair of positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Range {
            start: at.clone(),
            end: at,
        }
    }

    /// Range over a single text node, by char offsets
    pub fn in_text(path: NodePath, start: usize, end: usize) -> Self {
        Range::new(Position::new(path.clone(), start), Position::new(path, end))
    }

    /// Range over every top-level node
    pub fn whole_document(doc: &Document) -> Self {
        Range::new(Position::root(0), Position::root(doc.children().len()))
    }

    /// Range over the full contents of the node at `path`
    pub fn select_contents(doc: &Document, path: &[usize]) -> Option<Self> {
        let len = doc.boundary_len(path)?;
        Some(Range::new(
            Position::new(path.to_vec(), 0),
            Position::new(path.to_vec(), len),
        ))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Both ends resolve and start does not come after end
    pub fn validate(&self, doc: &Document) -> Result<(), RangeError> {
        self.start.validate(doc)?;
        self.end.validate(doc)?;
        if self.start > self.end {
            return Err(RangeError::Reversed);
        }
        Ok(())
    }

    /// Longest shared path prefix of both ends. May name a text node when
    /// both ends sit inside the same one.
    pub fn common_ancestor(&self) -> NodePath {
        self.start
            .path
            .iter()
            .zip(self.end.path.iter())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| *a)
            .collect()
    }

    /// Same range with both ends moved off text-node edges
    pub fn to_boundaries(&self, doc: &Document) -> Range {
        Range::new(self.start.to_boundary(doc), self.end.to_boundary(doc))
    }
}
