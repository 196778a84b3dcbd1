//! Translation between page nodes and their counterparts in the mirrored document.
//!
//! Both trees are rendered from the same markup, so a node is addressed by the
//! child indices leading to it from a shared scope (toolbar or surface root).
//! Text offsets are UTF-16 units on the page and chars in the mirror.

use lexcms_editor_core::{Document, NodeId, Position};
use web_sys::Node;

/// Child indices from `scope` down to `node`, or `None` if `node` is outside `scope`.
pub fn path_from(scope: &Node, node: &Node) -> Option<Vec<u32>> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while !current.is_same_node(Some(scope)) {
        let parent = current.parent_node()?;
        let siblings = parent.child_nodes();
        let index = (0..siblings.length()).find(|&i| {
            siblings
                .item(i)
                .is_some_and(|sibling| sibling.is_same_node(Some(&current)))
        })?;
        path.push(index);
        current = parent;
    }
    path.reverse();
    Some(path)
}

pub fn page_node_at(scope: &Node, path: &[u32]) -> Option<Node> {
    path.iter()
        .try_fold(scope.clone(), |node, &index| node.child_nodes().item(index))
}

pub fn core_node_at(doc: &Document, scope: NodeId, path: &[u32]) -> Option<NodeId> {
    path.iter()
        .try_fold(scope, |node, &index| doc.child_at(node, index as usize))
}

pub fn core_path(doc: &Document, scope: NodeId, node: NodeId) -> Option<Vec<u32>> {
    let mut path = Vec::new();
    let mut current = node;
    while current != scope {
        path.push(u32::try_from(doc.index_of(current)?).ok()?);
        current = doc.parent(current)?;
    }
    path.reverse();
    Some(path)
}

pub fn utf16_to_chars(text: &str, offset: u32) -> usize {
    let mut units = 0u32;
    for (index, c) in text.chars().enumerate() {
        if units >= offset {
            return index;
        }
        units += c.len_utf16() as u32;
    }
    text.chars().count()
}

pub fn chars_to_utf16(text: &str, offset: usize) -> u32 {
    text.chars().take(offset).map(|c| c.len_utf16() as u32).sum()
}

/// Map a page boundary point into the mirror.
pub fn core_position(
    doc: &Document,
    page_scope: &Node,
    core_scope: NodeId,
    node: &Node,
    offset: u32,
) -> Option<Position> {
    let path = path_from(page_scope, node)?;
    let core = core_node_at(doc, core_scope, &path)?;
    let offset = match doc.text(core) {
        Some(text) => utf16_to_chars(text, offset),
        None => offset as usize,
    };
    Some(Position::new(core, offset))
}

/// Map a mirror boundary point onto the page.
pub fn page_position(
    doc: &Document,
    core_scope: NodeId,
    page_scope: &Node,
    position: Position,
) -> Option<(Node, u32)> {
    let path = core_path(doc, core_scope, position.node)?;
    let node = page_node_at(page_scope, &path)?;
    let offset = match doc.text(position.node) {
        Some(text) => chars_to_utf16(text, position.offset),
        None => u32::try_from(position.offset).ok()?,
    };
    Some((node, offset))
}
