//! Image selection tracking, scoped per editor surface.

use std::collections::HashMap;

use indextree::NodeId;

use crate::config::ClassNames;
use crate::dom::Document;
use crate::range::TextSelection;
use crate::types::SurfaceId;
use crate::wrapper::{image_in, wrapper_of};

/// Remembers which image is selected in each surface.
///
/// References are weak in practice: a tracked image that has since been
/// detached is ignored on lookup.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: HashMap<SurfaceId, NodeId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `image` in the surface rooted at `root`, or clear the selection with `None`.
    ///
    /// Markers are removed from every image and wrapper in that surface only.
    /// An image outside the surface clears the selection.
    pub fn select(
        &mut self,
        doc: &mut Document,
        classes: &ClassNames,
        surface: &SurfaceId,
        root: NodeId,
        image: Option<NodeId>,
    ) -> Option<NodeId> {
        for marked in doc.query_all(root, |el| el.has_class(&classes.selected)) {
            doc.remove_class(marked, &classes.selected);
        }
        let image = image.filter(|&img| doc.is_tag(img, "img") && doc.contains(root, img));
        match image {
            Some(img) => {
                doc.add_class(img, &classes.selected);
                if let Some(wrapper) = wrapper_of(doc, classes, img) {
                    doc.add_class(wrapper, &classes.selected);
                }
                self.selected.insert(surface.clone(), img);
                tracing::debug!(%surface, ?img, "image selected");
            }
            None => {
                if self.selected.remove(surface).is_some() {
                    tracing::debug!(%surface, "image selection cleared");
                }
            }
        }
        image
    }

    /// The tracked image for a surface, whether or not it is still attached.
    pub fn tracked(&self, surface: &SurfaceId) -> Option<NodeId> {
        self.selected.get(surface).copied()
    }

    /// Resolve the image the next command should act on.
    ///
    /// In order: the tracked image if still inside the surface; the image the
    /// text selection covers or sits in; a marked image in the surface.
    pub fn resolve_image(
        &self,
        doc: &Document,
        classes: &ClassNames,
        surface: &SurfaceId,
        root: NodeId,
        selection: Option<TextSelection>,
    ) -> Option<NodeId> {
        if let Some(img) = self.tracked(surface) {
            if doc.is_connected(img) && doc.contains(root, img) {
                return Some(img);
            }
        }
        if let Some(img) = selection.and_then(|sel| image_at(doc, classes, root, sel)) {
            return Some(img);
        }
        doc.query(root, |el| el.is("img") && el.has_class(&classes.selected))
    }

    /// Drop any reference to `image` (after it was removed).
    pub fn forget(&mut self, image: NodeId) {
        self.selected.retain(|_, img| *img != image);
    }

    /// Drop the surface's selection without touching markers.
    pub fn clear_surface(&mut self, surface: &SurfaceId) {
        self.selected.remove(surface);
    }
}

/// The image a text selection covers or sits in, if it lies inside `root`.
///
/// A selection spanning exactly one wrapper or image (`selectNode`) picks that
/// node. Otherwise only the anchor's enclosing wrapper or image counts; a
/// caret next to an image does not select it.
pub fn image_at(
    doc: &Document,
    classes: &ClassNames,
    root: NodeId,
    selection: TextSelection,
) -> Option<NodeId> {
    let anchor = selection.anchor;
    if !doc.contains(root, anchor.node) {
        return None;
    }
    if let Some(child) = covered_node(doc, selection) {
        if doc.is_tag(child, "img") {
            return Some(child);
        }
        if doc.has_class(child, &classes.wrapper) {
            if let Some(img) = image_in(doc, child) {
                return Some(img);
            }
        }
    }
    let element = if doc.is_element(anchor.node) {
        anchor.node
    } else {
        doc.parent(anchor.node)?
    };
    if let Some(wrapper) = doc.closest_within(element, root, |el| el.has_class(&classes.wrapper)) {
        return image_in(doc, wrapper);
    }
    doc.closest_within(element, root, |el| el.is("img"))
}

/// The single child a selection spans between two adjacent element offsets.
fn covered_node(doc: &Document, selection: TextSelection) -> Option<NodeId> {
    let (anchor, focus) = (selection.anchor, selection.focus);
    if anchor.node != focus.node || !doc.is_element(anchor.node) {
        return None;
    }
    let start = anchor.offset.min(focus.offset);
    if anchor.offset.max(focus.offset) != start + 1 {
        return None;
    }
    doc.child_at(anchor.node, start)
}
