//! Drag-to-reposition for image wrappers.
//!
//! State machine: `Idle -> Dragging -> (Dropped | Cancelled) -> Idle`. At most
//! one session exists per page. Every exit path cleans up: the session is
//! cleared, drop hints are removed and the ghost drag image is detached.
//! A drop that cannot be placed inside the owning surface puts the wrapper
//! back where it started.

use indextree::NodeId;

use crate::config::ClassNames;
use crate::dom::Document;
use crate::edit::closest_block;
use crate::error::DomError;
use crate::range::{Position, insert_at};
use crate::types::SurfaceId;
use crate::wrapper::is_wrapper;

/// An in-progress drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub wrapper: NodeId,
    pub origin_parent: NodeId,
    pub origin_next: Option<NodeId>,
    pub surface: SurfaceId,
    pub surface_root: NodeId,
    pub ghost: NodeId,
}

/// Data-transfer setup the platform applies on drag start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragStart {
    pub effect_allowed: &'static str,
    pub data_type: &'static str,
    pub data: &'static str,
    /// Element to use as the drag image (an invisible 1x1 box).
    pub drag_image: NodeId,
}

/// Where a dropped wrapper ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Reordered before another wrapper.
    BeforeWrapper(NodeId),
    /// Inserted at the caret.
    AtCaret,
    /// The caret resolved to the surface root; appended to the enclosing block.
    EndOfBlock(NodeId),
    /// No caret was available; appended to the surface.
    AppendedToSurface,
    /// Restored to its original position.
    RolledBack(RollbackReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackReason {
    /// Dropped outside any editor surface.
    OutsideEditor,
    /// Dropped into a different editor surface.
    ForeignEditor,
    /// The drop target would have put the wrapper inside itself.
    SelfContainment,
    /// The drag ended without a drop, or was cancelled.
    NoDrop,
    /// Insertion failed and the wrapper was left outside the surface.
    InsertFailed,
}

/// Result of a drop event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DropResult {
    /// Whether the platform must suppress the default drop behaviour.
    pub prevent_default: bool,
    /// `None` when no drag was active.
    pub outcome: Option<DropOutcome>,
}

/// Owner of the single drag session.
#[derive(Debug, Clone, Default)]
pub struct DragEngine {
    session: Option<DragSession>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Begin dragging the wrapper enclosing `target`.
    ///
    /// Returns `None` (and changes nothing) when `target` is not inside a
    /// wrapper within the surface. A stale session is rolled back first.
    pub fn start(
        &mut self,
        doc: &mut Document,
        classes: &ClassNames,
        surface: &SurfaceId,
        surface_root: NodeId,
        target: NodeId,
    ) -> Result<Option<DragStart>, DomError> {
        let wrapper = doc
            .closest(target, |el| el.has_class(&classes.wrapper))
            .filter(|&w| w != surface_root && doc.contains(surface_root, w));
        let Some(wrapper) = wrapper else {
            return Ok(None);
        };
        if let Some(stale) = self.session.take() {
            tracing::debug!(wrapper = ?stale.wrapper, "rolling back stale drag session");
            rollback(doc, &stale);
            cleanup(doc, classes, &stale);
        }

        let origin_parent = doc.parent(wrapper).ok_or(DomError::Detached)?;
        let origin_next = doc.next_sibling(wrapper);
        let ghost = create_ghost(doc)?;

        self.session = Some(DragSession {
            wrapper,
            origin_parent,
            origin_next,
            surface: surface.clone(),
            surface_root,
            ghost,
        });
        tracing::debug!(%surface, ?wrapper, "drag started");
        Ok(Some(DragStart {
            effect_allowed: "move",
            data_type: "text/plain",
            data: "img-drag",
            drag_image: ghost,
        }))
    }

    /// Handle `dragover` anywhere in the page. Returns whether to prevent default.
    ///
    /// `target_surface` is the root of the surface under the pointer, if any.
    pub fn over(
        &mut self,
        doc: &mut Document,
        classes: &ClassNames,
        target_surface: Option<NodeId>,
        target: NodeId,
    ) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        if target_surface == Some(session.surface_root) {
            let hovered = doc
                .closest(target, |el| el.has_class(&classes.wrapper))
                .filter(|&w| w != session.wrapper);
            if let Some(hovered) = hovered {
                doc.add_class(hovered, &classes.drag_over);
            }
        }
        true
    }

    /// Handle `dragleave`: clear the hint on the wrapper being left.
    pub fn leave(&mut self, doc: &mut Document, classes: &ClassNames, target: NodeId) {
        if self.session.is_none() {
            return;
        }
        if let Some(left) = doc.closest(target, |el| el.has_class(&classes.wrapper)) {
            doc.remove_class(left, &classes.drag_over);
        }
    }

    /// Handle `drop`.
    ///
    /// `caret` is the platform's caret position under the pointer, if it could
    /// resolve one.
    pub fn drop(
        &mut self,
        doc: &mut Document,
        classes: &ClassNames,
        target_surface: Option<NodeId>,
        target: NodeId,
        caret: Option<Position>,
    ) -> DropResult {
        let Some(session) = self.session.take() else {
            return DropResult::default();
        };
        let outcome = match target_surface {
            None => {
                rollback(doc, &session);
                DropOutcome::RolledBack(RollbackReason::OutsideEditor)
            }
            Some(root) if root != session.surface_root => {
                rollback(doc, &session);
                DropOutcome::RolledBack(RollbackReason::ForeignEditor)
            }
            Some(_) => place(doc, classes, &session, target, caret),
        };
        cleanup(doc, classes, &session);
        tracing::debug!(wrapper = ?session.wrapper, ?outcome, "drop handled");
        DropResult {
            prevent_default: true,
            outcome: Some(outcome),
        }
    }

    /// Handle `dragend`. If no drop consumed the session, roll back.
    pub fn end(&mut self, doc: &mut Document, classes: &ClassNames) -> Option<DropOutcome> {
        self.cancel(doc, classes)
    }

    /// Abort the drag (Escape, window blur) and restore the wrapper.
    pub fn cancel(&mut self, doc: &mut Document, classes: &ClassNames) -> Option<DropOutcome> {
        let session = self.session.take()?;
        rollback(doc, &session);
        cleanup(doc, classes, &session);
        tracing::debug!(wrapper = ?session.wrapper, "drag cancelled");
        Some(DropOutcome::RolledBack(RollbackReason::NoDrop))
    }

    /// Forget the session without moving anything (its surface content was replaced).
    pub fn abandon(&mut self, doc: &mut Document, classes: &ClassNames) {
        if let Some(session) = self.session.take() {
            cleanup(doc, classes, &session);
        }
    }
}

fn create_ghost(doc: &mut Document) -> Result<NodeId, DomError> {
    let ghost = doc.create_element("div");
    for (prop, value) in [
        ("width", "1px"),
        ("height", "1px"),
        ("opacity", "0"),
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
    ] {
        doc.set_style(ghost, prop, value);
    }
    let host = doc.body().unwrap_or(doc.root());
    doc.append(host, ghost)?;
    Ok(ghost)
}

fn place(
    doc: &mut Document,
    classes: &ClassNames,
    session: &DragSession,
    target: NodeId,
    caret: Option<Position>,
) -> DropOutcome {
    let dragged = session.wrapper;
    let root = session.surface_root;

    let over_wrapper = doc
        .closest(target, |el| el.has_class(&classes.wrapper))
        .filter(|&w| w != dragged && is_wrapper(doc, classes, w) && doc.contains(root, w))
        .filter(|&w| !doc.contains(dragged, w));
    if let Some(other) = over_wrapper {
        doc.remove_class(other, &classes.drag_over);
        let placed = doc
            .parent(other)
            .ok_or(DomError::Detached)
            .and_then(|parent| doc.insert_before(parent, dragged, Some(other)));
        return match placed {
            Ok(()) => DropOutcome::BeforeWrapper(other),
            Err(e) => {
                tracing::warn!(error = %e, "reordering before wrapper failed");
                rollback(doc, session);
                DropOutcome::RolledBack(RollbackReason::InsertFailed)
            }
        };
    }

    let (placed, outcome) = match caret {
        Some(pos) if doc.contains(dragged, pos.node) => {
            rollback(doc, session);
            return DropOutcome::RolledBack(RollbackReason::SelfContainment);
        }
        Some(pos) if !doc.contains(root, pos.node) => {
            (doc.append(root, dragged), DropOutcome::AppendedToSurface)
        }
        Some(pos) if pos.node == root => {
            match closest_block(doc, target, root).filter(|&b| !doc.contains(dragged, b)) {
                Some(block) => (doc.append(block, dragged), DropOutcome::EndOfBlock(block)),
                None => (insert_at(doc, pos, dragged), DropOutcome::AtCaret),
            }
        }
        Some(pos) => (insert_at(doc, pos, dragged), DropOutcome::AtCaret),
        None => (doc.append(root, dragged), DropOutcome::AppendedToSurface),
    };

    let outcome = match placed {
        Ok(()) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "drop insertion failed, appending to surface");
            match doc.append(root, dragged) {
                Ok(()) => DropOutcome::AppendedToSurface,
                Err(e) => {
                    tracing::warn!(error = %e, "appending dropped wrapper failed");
                    rollback(doc, session);
                    return DropOutcome::RolledBack(RollbackReason::InsertFailed);
                }
            }
        }
    };
    if !doc.contains(root, dragged) {
        rollback(doc, session);
        return DropOutcome::RolledBack(RollbackReason::InsertFailed);
    }
    outcome
}

/// Put the wrapper back at its origin.
///
/// A moved origin sibling means append to the origin parent; a detached origin
/// parent means append to the owning surface.
fn rollback(doc: &mut Document, session: &DragSession) {
    let wrapper = session.wrapper;
    let parent_usable = doc.is_connected(session.origin_parent)
        && doc.contains(session.surface_root, session.origin_parent)
        && !doc.contains(wrapper, session.origin_parent);
    let result = if parent_usable {
        let reference = session
            .origin_next
            .filter(|&n| n != wrapper && doc.parent(n) == Some(session.origin_parent));
        doc.insert_before(session.origin_parent, wrapper, reference)
    } else {
        doc.append(session.surface_root, wrapper)
    };
    match result {
        Ok(()) => tracing::debug!(?wrapper, "drag rolled back"),
        Err(e) => tracing::warn!(error = %e, ?wrapper, "drag rollback failed"),
    }
}

fn cleanup(doc: &mut Document, classes: &ClassNames, session: &DragSession) {
    for hinted in doc.query_all(doc.root(), |el| el.has_class(&classes.drag_over)) {
        doc.remove_class(hinted, &classes.drag_over);
    }
    doc.remove(session.ghost);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::ensure_resizable_images;

    struct Fixture {
        doc: Document,
        classes: ClassNames,
        a: NodeId,
        b: NodeId,
        wrappers: Vec<NodeId>,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::parse(
            "<body><div id=\"a\"><p>one<img src=\"https://x/1.png\">two</p>\
             <p>three<img src=\"https://x/2.png\"></p></div>\
             <div id=\"b\"><p>other</p></div><footer>outside</footer></body>",
        );
        let classes = ClassNames::default();
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        let wrappers = ensure_resizable_images(&mut doc, &classes, a).unwrap();
        Fixture {
            doc,
            classes,
            a,
            b,
            wrappers,
        }
    }

    #[test]
    fn test_start_requires_wrapper() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let p = f.doc.first_child(f.a).unwrap();
        let started = engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, p)
            .unwrap();
        assert_eq!(started, None);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_start_sets_up_transfer_and_ghost() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let img = f.doc.first_child(f.wrappers[0]).unwrap();
        let start = engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, img)
            .unwrap()
            .unwrap();
        assert_eq!(start.effect_allowed, "move");
        assert_eq!(start.data, "img-drag");
        assert_eq!(f.doc.parent(start.drag_image), f.doc.body());
        assert_eq!(
            f.doc.attr(start.drag_image, "style"),
            Some("width: 1px; height: 1px; opacity: 0; position: fixed; top: 0; left: 0;")
        );
        assert_eq!(engine.session().unwrap().wrapper, f.wrappers[0]);
    }

    #[test]
    fn test_drop_before_other_wrapper() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let (first, second) = (f.wrappers[0], f.wrappers[1]);
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, second)
            .unwrap();
        assert!(engine.over(&mut f.doc, &f.classes, Some(f.a), first));
        assert!(f.doc.has_class(first, "drag-over"));

        let result = engine.drop(&mut f.doc, &f.classes, Some(f.a), first, None);
        assert!(result.prevent_default);
        assert_eq!(result.outcome, Some(DropOutcome::BeforeWrapper(first)));
        assert_eq!(f.doc.next_sibling(second), Some(first));
        assert!(!f.doc.has_class(first, "drag-over"));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_drop_at_caret() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let other = f.doc.query(f.a, |el| el.is("p")).unwrap();
        let three_p = f.doc.next_sibling(other).unwrap();
        let three = f.doc.first_child(three_p).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        let result = engine.drop(
            &mut f.doc,
            &f.classes,
            Some(f.a),
            three,
            Some(Position::new(three, 2)),
        );
        assert_eq!(result.outcome, Some(DropOutcome::AtCaret));
        assert_eq!(f.doc.parent(wrapper), Some(three_p));
        assert_eq!(f.doc.text_content(other), "onetwo");
        assert_eq!(f.doc.text(f.doc.first_child(three_p).unwrap()), Some("th"));
    }

    #[test]
    fn test_drop_at_surface_root_goes_to_block_end() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[1];
        let first_p = f.doc.first_child(f.a).unwrap();
        let text = f.doc.first_child(first_p).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        let result = engine.drop(
            &mut f.doc,
            &f.classes,
            Some(f.a),
            text,
            Some(Position::new(f.a, 0)),
        );
        assert_eq!(result.outcome, Some(DropOutcome::EndOfBlock(first_p)));
        assert_eq!(f.doc.last_child(first_p), Some(wrapper));
    }

    #[test]
    fn test_drop_into_foreign_surface_rolls_back() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let before = f.doc.inner_html(f.a);
        let target = f.doc.first_child(f.b).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        let result = engine.drop(&mut f.doc, &f.classes, Some(f.b), target, None);
        assert_eq!(
            result.outcome,
            Some(DropOutcome::RolledBack(RollbackReason::ForeignEditor))
        );
        assert!(result.prevent_default);
        assert_eq!(f.doc.inner_html(f.a), before);
        assert_eq!(f.doc.inner_html(f.b), "<p>other</p>");
    }

    #[test]
    fn test_drop_outside_rolls_back() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let before = f.doc.inner_html(f.a);
        let footer = f.doc.query(f.doc.root(), |el| el.is("footer")).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        let result = engine.drop(&mut f.doc, &f.classes, None, footer, None);
        assert_eq!(
            result.outcome,
            Some(DropOutcome::RolledBack(RollbackReason::OutsideEditor))
        );
        assert_eq!(f.doc.inner_html(f.a), before);
        assert!(f.doc.query(f.doc.root(), |el| el.is("footer")).is_some());
    }

    #[test]
    fn test_drop_into_itself_rolls_back() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let before = f.doc.inner_html(f.a);
        let button = f.doc.last_child(wrapper).unwrap();
        let label = f.doc.first_child(button).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        let result = engine.drop(
            &mut f.doc,
            &f.classes,
            Some(f.a),
            label,
            Some(Position::new(label, 0)),
        );
        assert_eq!(
            result.outcome,
            Some(DropOutcome::RolledBack(RollbackReason::SelfContainment))
        );
        assert_eq!(f.doc.inner_html(f.a), before);
    }

    #[test]
    fn test_cancel_restores_and_cleans_up() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let before = f.doc.inner_html(f.a);
        let start = engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap()
            .unwrap();
        engine.over(&mut f.doc, &f.classes, Some(f.a), f.wrappers[1]);
        assert_eq!(
            engine.cancel(&mut f.doc, &f.classes),
            Some(DropOutcome::RolledBack(RollbackReason::NoDrop))
        );
        assert!(!engine.is_active());
        assert!(!f.doc.is_connected(start.drag_image));
        assert_eq!(f.doc.inner_html(f.a), before);
        assert_eq!(engine.end(&mut f.doc, &f.classes), None);
    }

    #[test]
    fn test_rollback_tolerates_moved_sibling() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let p = f.doc.parent(wrapper).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        // The sibling that followed the wrapper disappears mid-drag.
        let two = f.doc.next_sibling(wrapper).unwrap();
        f.doc.remove(two);
        engine.cancel(&mut f.doc, &f.classes);
        assert_eq!(f.doc.parent(wrapper), Some(p));
        assert_eq!(f.doc.last_child(p), Some(wrapper));
    }

    #[test]
    fn test_rollback_with_detached_origin_parent() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let wrapper = f.wrappers[0];
        let p = f.doc.parent(wrapper).unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, wrapper)
            .unwrap();
        f.doc.remove(p);
        engine.cancel(&mut f.doc, &f.classes);
        assert_eq!(f.doc.parent(wrapper), Some(f.a));
    }

    #[test]
    fn test_stale_session_is_replaced() {
        let mut f = fixture();
        let mut engine = DragEngine::new();
        let first = engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, f.wrappers[0])
            .unwrap()
            .unwrap();
        engine
            .start(&mut f.doc, &f.classes, &"a".into(), f.a, f.wrappers[1])
            .unwrap();
        assert!(!f.doc.is_connected(first.drag_image));
        assert_eq!(engine.session().unwrap().wrapper, f.wrappers[1]);
    }
}
