//! Anchor normalisation inside a surface.

use indextree::NodeId;

use crate::dom::Document;

/// Force every anchor under `scope` to open in a new tab without an opener.
pub fn ensure_link_targets(doc: &mut Document, scope: NodeId) {
    for anchor in doc.query_all(scope, |el| el.is("a")) {
        doc.set_attr(anchor, "target", "_blank");
        doc.set_attr(anchor, "rel", "noopener noreferrer");
    }
}

/// The anchor enclosing `node` within `scope`, if any.
pub fn enclosing_anchor(doc: &Document, node: NodeId, scope: NodeId) -> Option<NodeId> {
    doc.closest_within(node, scope, |el| el.is("a"))
}
