//! Boundary points, selections and range surgery on the document tree.
//!
//! Offsets follow DOM conventions: a character offset inside text and comment
//! nodes, a child index inside elements.

use std::cmp::Ordering;

use indextree::NodeId;

use crate::dom::Document;
use crate::error::DomError;

/// A boundary point in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The point just before `node` in its parent.
    pub fn before(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)?))
    }

    /// The point just after `node` in its parent.
    pub fn after(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)? + 1))
    }

    /// The point at the end of `node`'s contents.
    pub fn end_of(doc: &Document, node: NodeId) -> Self {
        Self::new(node, doc.node_len(node))
    }

    /// Whether the point still addresses a connected node within bounds.
    pub fn is_valid(&self, doc: &Document) -> bool {
        doc.is_connected(self.node) && self.offset <= doc.node_len(self.node)
    }
}

/// The user's text selection: an anchor and a focus that may be in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: Position,
    pub focus: Position,
}

impl TextSelection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(at: Position) -> Self {
        Self::new(at, at)
    }

    /// Select exactly `node` within its parent.
    pub fn select_node(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(
            Position::before(doc, node)?,
            Position::after(doc, node)?,
        ))
    }

    /// Select all contents of `node`.
    pub fn select_node_contents(doc: &Document, node: NodeId) -> Self {
        Self::new(Position::new(node, 0), Position::end_of(doc, node))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        self.anchor.is_valid(doc) && self.focus.is_valid(doc)
    }

    /// The selection as a document-ordered range.
    pub fn to_range(&self, doc: &Document) -> DomRange {
        match compare_points(doc, self.anchor, self.focus) {
            Ordering::Greater => DomRange::new(self.focus, self.anchor),
            _ => DomRange::new(self.anchor, self.focus),
        }
    }
}

/// A range with `start` at or before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Position,
    pub end: Position,
}

impl DomRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self::new(at, at)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn as_selection(&self) -> TextSelection {
        TextSelection::new(self.start, self.end)
    }
}

/// Document-order comparison of two boundary points.
///
/// Points in disconnected trees compare equal.
pub fn compare_points(doc: &Document, a: Position, b: Position) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    let a_chain = doc.ancestors(a.node);
    let b_chain = doc.ancestors(b.node);

    if let Some(i) = b_chain.iter().position(|&n| n == a.node) {
        let child_index = doc.index_of(b_chain[i - 1]).unwrap_or(0);
        return if child_index < a.offset {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if let Some(i) = a_chain.iter().position(|&n| n == b.node) {
        let child_index = doc.index_of(a_chain[i - 1]).unwrap_or(0);
        return if child_index < b.offset {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    for (i, n) in a_chain.iter().enumerate() {
        if let Some(j) = b_chain.iter().position(|m| m == n) {
            let a_child = doc.index_of(a_chain[i - 1]);
            let b_child = doc.index_of(b_chain[j - 1]);
            return a_child.cmp(&b_child);
        }
    }
    Ordering::Equal
}

/// Deepest node containing both ends of the range. Never a text node.
pub fn common_container(doc: &Document, range: &DomRange) -> Option<NodeId> {
    let b_chain = doc.ancestors(range.end.node);
    doc.ancestors(range.start.node)
        .into_iter()
        .find(|n| b_chain.contains(n) && !doc.is_text(*n))
}

/// Whether `node` is partially or fully inside the range.
///
/// A collapsed range intersects the nodes that contain it.
pub fn intersects(doc: &Document, range: &DomRange, node: NodeId) -> bool {
    let (Some(before), Some(after)) = (Position::before(doc, node), Position::after(doc, node))
    else {
        return false;
    };
    compare_points(doc, before, range.end) == Ordering::Less
        && compare_points(doc, after, range.start) == Ordering::Greater
}

/// Split a text node at a character offset. Returns the new node holding the tail.
pub fn split_text(doc: &mut Document, text: NodeId, offset: usize) -> Result<NodeId, DomError> {
    let value = doc.text(text).ok_or(DomError::NotText)?;
    let byte = value
        .char_indices()
        .nth(offset)
        .map_or(value.len(), |(i, _)| i);
    let tail = value[byte..].to_string();
    let head = value[..byte].to_string();
    if doc.parent(text).is_none() {
        return Err(DomError::Detached);
    }
    doc.set_text(text, head)?;
    let node = doc.create_text(tail);
    doc.insert_after(node, text)?;
    Ok(node)
}

/// Split the tree at `point` up to (not including) `limit`.
///
/// Returns the child index in `limit` at which the split lies: everything
/// before the point now lives in children before that index, everything after
/// in children from that index on. Elements split this way are shallow-cloned.
pub fn split_to(doc: &mut Document, point: Position, limit: NodeId) -> Result<usize, DomError> {
    if !doc.contains(limit, point.node) {
        return Err(DomError::OutsideScope);
    }
    let mut container = point.node;
    let mut offset = point.offset;

    if doc.text(container).is_some() {
        if container == limit {
            return Err(DomError::NotAContainer);
        }
        let parent = doc.parent(container).ok_or(DomError::Detached)?;
        let idx = doc.index_of(container).ok_or(DomError::Detached)?;
        let len = doc.node_len(container);
        offset = if offset == 0 {
            idx
        } else if offset >= len {
            idx + 1
        } else {
            split_text(doc, container, offset)?;
            idx + 1
        };
        container = parent;
    }

    while container != limit {
        let parent = doc.parent(container).ok_or(DomError::Detached)?;
        let idx = doc.index_of(container).ok_or(DomError::Detached)?;
        let count = doc.child_count(container);
        offset = if offset == 0 {
            idx
        } else if offset >= count {
            idx + 1
        } else {
            let clone = doc.shallow_clone(container).ok_or(DomError::Detached)?;
            for child in doc.children(container).into_iter().skip(offset) {
                doc.append(clone, child)?;
            }
            doc.insert_after(clone, container)?;
            idx + 1
        };
        container = parent;
    }
    Ok(offset)
}

/// Nodes lifted out of the tree by [`extract`], and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Top-level extracted nodes, in document order, now detached.
    pub nodes: Vec<NodeId>,
    /// The container they were lifted from.
    pub parent: NodeId,
    /// The node that followed them, if any.
    pub before: Option<NodeId>,
}

impl Extracted {
    /// The point the nodes were removed from.
    pub fn position(&self, doc: &Document) -> Position {
        match self.before.and_then(|b| doc.index_of(b)) {
            Some(idx) => Position::new(self.parent, idx),
            None => Position::end_of(doc, self.parent),
        }
    }
}

/// Lift the contents of `range` out of `limit`, splitting partially selected nodes.
pub fn extract(doc: &mut Document, range: &DomRange, limit: NodeId) -> Result<Extracted, DomError> {
    // End first: splitting at the start never moves the end's node.
    let end_idx = split_to(doc, range.end, limit)?;
    let before = doc.child_at(limit, end_idx);
    let start_idx = split_to(doc, range.start, limit)?;

    let mut nodes = Vec::new();
    let mut cursor = doc.child_at(limit, start_idx);
    while let Some(node) = cursor {
        if Some(node) == before {
            break;
        }
        cursor = doc.next_sibling(node);
        nodes.push(node);
    }
    for &node in &nodes {
        doc.remove(node);
    }
    Ok(Extracted {
        nodes,
        parent: limit,
        before,
    })
}

/// Insert `node` at a boundary point, splitting a text node if needed.
pub fn insert_at(doc: &mut Document, at: Position, node: NodeId) -> Result<(), DomError> {
    if doc.contains(node, at.node) {
        return Err(DomError::HierarchyRequest);
    }
    if doc.text(at.node).is_some() {
        let parent = doc.parent(at.node).ok_or(DomError::Detached)?;
        let len = doc.node_len(at.node);
        return if at.offset == 0 {
            doc.insert_before(parent, node, Some(at.node))
        } else if at.offset >= len {
            doc.insert_after(node, at.node)
        } else {
            let tail = split_text(doc, at.node, at.offset)?;
            doc.insert_before(parent, node, Some(tail))
        };
    }
    let reference = doc.child_at(at.node, at.offset);
    doc.insert_before(at.node, node, reference)
}
