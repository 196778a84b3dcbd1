//! The editor session: one per page, owning every bound surface.
//!
//! Selection, drag and history state live here instead of in page globals,
//! keyed by surface so two editors on the same page never see each other's
//! state.

use std::collections::HashMap;

use indextree::NodeId;
use smol_str::SmolStr;

use crate::config::EditorConfig;
use crate::dom::Document;
use crate::drag::DragEngine;
use crate::edit::{EditOp, apply_edit};
use crate::error::{DomError, EditorError};
use crate::history::SnapshotHistory;
use crate::links::ensure_link_targets;
use crate::platform::EditorHost;
use crate::range::{DomRange, Position, TextSelection};
use crate::selection::SelectionTracker;
use crate::types::SurfaceId;
use crate::wrapper::{ensure_resizable_images, wrapper_of};

/// A bound editor surface.
#[derive(Debug, Clone)]
pub struct Surface {
    pub id: SurfaceId,
    pub root: NodeId,
    pub toolbar: NodeId,
    pub toolbar_id: SmolStr,
    pub history: SnapshotHistory,
}

/// Result of [`EditorSession::setup_rich_editor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The pair was bound now.
    Bound(SurfaceId),
    /// The toolbar already carries the bound marker; nothing changed.
    AlreadyBound,
    /// The toolbar or editor element does not exist.
    Missing,
}

/// Editor state for one page.
#[derive(Debug)]
pub struct EditorSession<H: EditorHost = ()> {
    pub(crate) doc: Document,
    pub(crate) config: EditorConfig,
    pub(crate) host: H,
    pub(crate) surfaces: HashMap<SurfaceId, Surface>,
    pub(crate) toolbars: HashMap<SmolStr, SurfaceId>,
    pub(crate) selection: Option<TextSelection>,
    pub(crate) tracker: SelectionTracker,
    pub(crate) drag: DragEngine,
}

impl<H: EditorHost> EditorSession<H> {
    pub fn new(doc: Document, host: H) -> Self {
        Self::with_config(doc, host, EditorConfig::default())
    }

    pub fn with_config(doc: Document, host: H, config: EditorConfig) -> Self {
        Self {
            doc,
            config,
            host,
            surfaces: HashMap::new(),
            toolbars: HashMap::new(),
            selection: None,
            tracker: SelectionTracker::new(),
            drag: DragEngine::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access to the page tree, for the page's own (non-editor) updates.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn drag(&self) -> &DragEngine {
        &self.drag
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// The current text selection, if it still points into the document.
    pub fn selection(&self) -> Option<TextSelection> {
        self.selection.filter(|s| s.is_valid(&self.doc))
    }

    /// Mirror the platform's text selection.
    pub fn set_selection(&mut self, selection: Option<TextSelection>) {
        self.selection = selection.filter(|s| s.is_valid(&self.doc));
    }

    pub fn surface(&self, id: &SurfaceId) -> Option<&Surface> {
        self.surfaces.get(id)
    }

    pub fn surface_ids(&self) -> impl Iterator<Item = &SurfaceId> {
        self.surfaces.keys()
    }

    pub fn surface_root(&self, id: &SurfaceId) -> Result<NodeId, EditorError> {
        self.surfaces
            .get(id)
            .map(|s| s.root)
            .ok_or_else(|| EditorError::UnknownSurface(id.clone()))
    }

    /// Bind a toolbar/editor pair. Safe to call repeatedly.
    ///
    /// The toolbar element carries `data-bound="1"` once bound; a regenerated
    /// section comes with a fresh toolbar and binds again.
    pub fn setup_rich_editor(&mut self, toolbar_id: &str, editor_id: &str) -> SetupOutcome {
        self.prune_detached();
        let (Some(toolbar), Some(root)) = (
            self.doc.get_element_by_id(toolbar_id),
            self.doc.get_element_by_id(editor_id),
        ) else {
            tracing::debug!(toolbar_id, editor_id, "editor setup skipped: element missing");
            return SetupOutcome::Missing;
        };
        if self.doc.attr(toolbar, "data-bound") == Some("1") {
            return SetupOutcome::AlreadyBound;
        }
        self.doc.set_attr(toolbar, "data-bound", "1");
        self.doc.add_class(root, &self.config.classes.surface);

        let id = SurfaceId::new(editor_id);
        if let Err(e) = ensure_resizable_images(&mut self.doc, &self.config.classes, root) {
            tracing::warn!(error = %e, surface = %id, "wrapping images at setup failed");
        }
        ensure_link_targets(&mut self.doc, root);

        let toolbar_id = SmolStr::new(toolbar_id);
        self.toolbars.retain(|_, surface| *surface != id);
        self.toolbars.insert(toolbar_id.clone(), id.clone());
        self.surfaces.insert(
            id.clone(),
            Surface {
                id: id.clone(),
                root,
                toolbar,
                toolbar_id,
                history: SnapshotHistory::new(self.config.history_depth),
            },
        );
        tracing::debug!(surface = %id, "editor surface bound");
        SetupOutcome::Bound(id)
    }

    /// Forget surfaces whose elements were replaced by a page re-render.
    fn prune_detached(&mut self) {
        let doc = &self.doc;
        let stale: Vec<SurfaceId> = self
            .surfaces
            .values()
            .filter(|s| !doc.is_connected(s.root) || !doc.is_connected(s.toolbar))
            .map(|s| s.id.clone())
            .collect();
        for id in stale {
            tracing::debug!(surface = %id, "pruning detached surface");
            self.surfaces.remove(&id);
            self.toolbars.retain(|_, surface| *surface != id);
            self.tracker.clear_surface(&id);
            if self.drag.session().is_some_and(|s| s.surface == id) {
                self.drag.abandon(&mut self.doc, &self.config.classes);
            }
        }
    }

    /// The bound surface containing `node`.
    pub fn surface_of(&self, node: NodeId) -> Option<SurfaceId> {
        self.surfaces
            .values()
            .find(|s| self.doc.is_connected(s.root) && self.doc.contains(s.root, node))
            .map(|s| s.id.clone())
    }

    pub(crate) fn toolbar_surface(&self, toolbar_id: &str) -> Result<SurfaceId, EditorError> {
        self.toolbars
            .get(toolbar_id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownToolbar(toolbar_id.to_string()))
    }

    /// The selection as a range if it lies inside `root`.
    pub(crate) fn selection_in(&self, root: NodeId) -> Option<DomRange> {
        self.selection()
            .filter(|s| self.doc.contains(root, s.anchor.node) && self.doc.contains(root, s.focus.node))
            .map(|s| s.to_range(&self.doc))
    }

    /// The selection inside `root`, else a caret at the end of the surface.
    pub(crate) fn selection_or_end(&self, root: NodeId) -> DomRange {
        self.selection_in(root)
            .unwrap_or_else(|| DomRange::collapsed(Position::end_of(&self.doc, root)))
    }

    /// The image the next image command acts on.
    pub fn resolve_image(&self, surface: &SurfaceId) -> Option<NodeId> {
        let root = self.surface_root(surface).ok()?;
        let selection = self
            .selection()
            .filter(|s| self.doc.contains(root, s.anchor.node));
        self.tracker
            .resolve_image(&self.doc, &self.config.classes, surface, root, selection)
    }

    /// Like [`resolve_image`](Self::resolve_image), but tells the user to pick an image first.
    pub fn require_image(&self, surface: &SurfaceId) -> Option<NodeId> {
        let image = self.resolve_image(surface);
        if image.is_none() {
            self.host.alert(&self.config.messages.select_image_first);
        }
        image
    }

    /// Select an image in a surface, or clear that surface's image selection.
    pub fn select_image(
        &mut self,
        surface: &SurfaceId,
        image: Option<NodeId>,
    ) -> Result<Option<NodeId>, EditorError> {
        let root = self.surface_root(surface)?;
        Ok(self
            .tracker
            .select(&mut self.doc, &self.config.classes, surface, root, image))
    }

    /// Remove an image and its wrapper from a surface.
    ///
    /// Deletion goes through the range edit path so the caret lands where the
    /// image was; if that fails the wrapper is detached directly. Returns
    /// whether anything was removed.
    pub fn remove_image(&mut self, surface: &SurfaceId, image: NodeId) -> Result<bool, EditorError> {
        let root = self.surface_root(surface)?;
        if !self.doc.is_connected(image) || !self.doc.contains(root, image) {
            return Ok(false);
        }
        self.record_history(surface)?;
        let target = wrapper_of(&self.doc, &self.config.classes, image)
            .filter(|&w| w != root && self.doc.contains(root, w))
            .unwrap_or(image);

        let deleted = TextSelection::select_node(&self.doc, target)
            .map(|s| s.to_range(&self.doc))
            .ok_or(DomError::Detached)
            .and_then(|range| {
                apply_edit(&mut self.doc, &self.config.classes, root, range, &EditOp::DeleteRange)
            });
        match deleted {
            Ok(selection) => {
                if selection.is_some() {
                    self.selection = selection;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "range delete of image failed, detaching directly");
                self.doc.remove(target);
            }
        }
        if self.doc.contains(root, target) {
            self.doc.remove(target);
        }
        self.tracker.forget(image);
        tracing::debug!(%surface, ?image, "image removed");
        Ok(true)
    }

    /// Snapshot a surface's markup before a mutation.
    pub(crate) fn record_history(&mut self, surface: &SurfaceId) -> Result<(), EditorError> {
        let root = self.surface_root(surface)?;
        let snapshot = self.doc.inner_html(root);
        if let Some(s) = self.surfaces.get_mut(surface) {
            s.history.record(snapshot);
        }
        Ok(())
    }

    pub fn can_undo(&self, surface: &SurfaceId) -> bool {
        self.surfaces
            .get(surface)
            .is_some_and(|s| s.history.can_undo())
    }

    pub fn can_redo(&self, surface: &SurfaceId) -> bool {
        self.surfaces
            .get(surface)
            .is_some_and(|s| s.history.can_redo())
    }

    /// Restore the surface to the state before the last recorded mutation.
    pub fn undo(&mut self, surface: &SurfaceId) -> Result<bool, EditorError> {
        let root = self.surface_root(surface)?;
        let current = self.doc.inner_html(root);
        let restored = self
            .surfaces
            .get_mut(surface)
            .and_then(|s| s.history.undo(current));
        match restored {
            Some(html) => self.restore(surface, root, &html).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn redo(&mut self, surface: &SurfaceId) -> Result<bool, EditorError> {
        let root = self.surface_root(surface)?;
        let current = self.doc.inner_html(root);
        let restored = self
            .surfaces
            .get_mut(surface)
            .and_then(|s| s.history.redo(current));
        match restored {
            Some(html) => self.restore(surface, root, &html).map(|()| true),
            None => Ok(false),
        }
    }

    fn restore(&mut self, surface: &SurfaceId, root: NodeId, html: &str) -> Result<(), EditorError> {
        self.reset_transient(surface, root);
        self.doc.set_inner_html(root, html)?;
        let classes = &self.config.classes;
        for marked in self.doc.query_all(root, |el| el.has_class(&classes.selected)) {
            self.doc.remove_class(marked, &classes.selected);
        }
        self.normalize(root);
        Ok(())
    }

    /// Drop state that points into a surface whose content is about to be replaced.
    pub(crate) fn reset_transient(&mut self, surface: &SurfaceId, root: NodeId) {
        self.tracker.clear_surface(surface);
        if self.drag.session().is_some_and(|s| s.surface_root == root) {
            self.drag.abandon(&mut self.doc, &self.config.classes);
        }
        if self.selection_in(root).is_some() {
            self.selection = None;
        }
    }

    /// Re-wrap images and re-apply link targets.
    pub(crate) fn normalize(&mut self, root: NodeId) {
        if let Err(e) = ensure_resizable_images(&mut self.doc, &self.config.classes, root) {
            tracing::warn!(error = %e, "wrapping images failed");
        }
        ensure_link_targets(&mut self.doc, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::parse(
            "<body><div id=\"tb1\"></div><div id=\"ed1\"><p>one</p></div>\
             <div id=\"tb2\"></div><div id=\"ed2\"><p><img src=\"https://x/2.png\"></p></div></body>",
        )
    }

    #[test]
    fn test_setup_is_idempotent() {
        let mut session = EditorSession::new(page(), ());
        assert_eq!(
            session.setup_rich_editor("tb1", "ed1"),
            SetupOutcome::Bound(SurfaceId::from("ed1"))
        );
        let html = session.document().to_string();
        assert_eq!(session.setup_rich_editor("tb1", "ed1"), SetupOutcome::AlreadyBound);
        assert_eq!(session.document().to_string(), html);
        assert_eq!(session.surface_ids().count(), 1);
    }

    #[test]
    fn test_setup_missing_elements_is_noop() {
        let mut session = EditorSession::new(page(), ());
        let before = session.document().to_string();
        assert_eq!(session.setup_rich_editor("nope", "ed1"), SetupOutcome::Missing);
        assert_eq!(session.setup_rich_editor("tb1", "nope"), SetupOutcome::Missing);
        assert_eq!(session.document().to_string(), before);
    }

    #[test]
    fn test_setup_wraps_existing_images() {
        let mut session = EditorSession::new(page(), ());
        session.setup_rich_editor("tb2", "ed2");
        let root = session.surface_root(&SurfaceId::from("ed2")).unwrap();
        let doc = session.document();
        assert!(doc.has_class(root, "editor-surface"));
        assert_eq!(doc.query_all(root, |el| el.has_class("img-resizable")).len(), 1);
    }

    #[test]
    fn test_rerendered_section_binds_again() {
        let mut session = EditorSession::new(page(), ());
        session.setup_rich_editor("tb1", "ed1");
        let body = session.document().body().unwrap();
        session
            .document_mut()
            .set_inner_html(body, "<div id=\"tb1\"></div><div id=\"ed1\"><p>two</p></div>")
            .unwrap();
        assert_eq!(
            session.setup_rich_editor("tb1", "ed1"),
            SetupOutcome::Bound(SurfaceId::from("ed1"))
        );
        let root = session.surface_root(&SurfaceId::from("ed1")).unwrap();
        assert_eq!(session.document().text_content(root), "two");
        assert_eq!(session.surface_ids().count(), 1);
    }

    #[test]
    fn test_remove_image_keeps_siblings() {
        let doc = Document::parse(
            "<div id=\"tb\"></div><div id=\"ed\"><p>a<img src=\"https://x/y.png\">b</p></div>",
        );
        let mut session = EditorSession::new(doc, ());
        session.setup_rich_editor("tb", "ed");
        let s = SurfaceId::from("ed");
        let root = session.surface_root(&s).unwrap();
        let img = session.document().query(root, |el| el.is("img")).unwrap();
        session.select_image(&s, Some(img)).unwrap();

        assert_eq!(session.remove_image(&s, img), Ok(true));
        assert_eq!(session.document().inner_html(root), "<p>ab</p>");
        assert_eq!(session.tracker().tracked(&s), None);
        assert_eq!(session.resolve_image(&s), None);
        assert!(session.can_undo(&s));
    }

    #[test]
    fn test_unknown_surface_is_an_error() {
        let mut session = EditorSession::new(page(), ());
        let ghost = SurfaceId::from("ed9");
        assert_eq!(
            session.select_image(&ghost, None),
            Err(EditorError::UnknownSurface(ghost.clone()))
        );
    }
}
