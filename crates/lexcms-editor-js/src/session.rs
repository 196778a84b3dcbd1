//! JsEditorSession - the editor session exposed to the admin page.

use std::collections::HashMap;
use std::fmt;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{DataTransfer, Element, HtmlSelectElement, Node};

use lexcms_editor_core::{
    ClickResult, Document, EditorCommand, EditorConfig, EditorError, EditorSession, Key,
    KeydownResult, NodeId, Position, SetupOutcome, SurfaceId, TextSelection, WrapperRect,
};

use crate::host::JsHost;
use crate::mirror::{core_node_at, core_position, page_position, path_from};
use crate::types::{JsCommandOutcome, JsSetupOutcome};

type InnerSession = EditorSession<JsHost>;

/// A bound toolbar/editor pair and its mirror in the session document.
struct Mirror {
    surface: SurfaceId,
    toolbar_id: String,
    toolbar: Element,
    editor: Element,
    /// Mirror node holding copies of both elements.
    container: NodeId,
}

/// One editor session per admin page.
///
/// Event handlers take the DOM event target; commands and content calls take
/// the editor element's id.
#[wasm_bindgen]
pub struct JsEditorSession {
    inner: InnerSession,
    mirrors: HashMap<String, Mirror>,
    /// Page-side drag image for the active drag.
    ghost: Option<Element>,
    on_change: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl JsEditorSession {
    /// Create a session. `config` is an optional partial `EditorConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditorSession, JsError> {
        let config = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid editor config: {}", e)))?
        };
        let doc = Document::parse("<body></body>");
        Ok(Self {
            inner: EditorSession::with_config(doc, JsHost, config),
            mirrors: HashMap::new(),
            ghost: None,
            on_change: None,
        })
    }

    /// Called with the editor id whenever a surface's content changes.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&mut self, callback: Option<js_sys::Function>) {
        self.on_change = callback;
    }

    /// Bind a toolbar/editor pair. Safe to call on every render of the page section.
    #[wasm_bindgen(js_name = setupRichEditor)]
    pub fn setup_rich_editor(
        &mut self,
        toolbar_id: &str,
        editor_id: &str,
    ) -> Result<JsSetupOutcome, JsError> {
        let page = page_document()?;
        let (Some(toolbar), Some(editor)) = (
            page.get_element_by_id(toolbar_id),
            page.get_element_by_id(editor_id),
        ) else {
            return Ok(JsSetupOutcome::Missing);
        };
        if toolbar.get_attribute("data-bound").as_deref() == Some("1") {
            return Ok(JsSetupOutcome::AlreadyBound);
        }
        self.drop_stale_mirrors(toolbar_id, editor_id);

        let doc = self.inner.document_mut();
        let container = doc.create_element("div");
        let body = doc.body().unwrap_or(doc.root());
        doc.append(body, container).map_err(js_error)?;
        doc.set_inner_html(
            container,
            &format!("{}{}", toolbar.outer_html(), editor.outer_html()),
        )
        .map_err(js_error)?;

        let surface = match self.inner.setup_rich_editor(toolbar_id, editor_id) {
            SetupOutcome::Bound(surface) => surface,
            other => {
                self.inner.document_mut().remove(container);
                return Ok(other.into());
            }
        };
        toolbar
            .set_attribute("data-bound", "1")
            .map_err(page_error)?;
        editor
            .class_list()
            .add_1(&self.inner.config().classes.surface)
            .map_err(page_error)?;
        self.mirrors.insert(
            editor_id.to_string(),
            Mirror {
                surface,
                toolbar_id: toolbar_id.to_string(),
                toolbar,
                editor,
                container,
            },
        );
        self.render(editor_id)?;
        tracing::debug!(toolbar_id, editor_id, "editor bound to page");
        Ok(JsSetupOutcome::Bound)
    }

    /// Run a command object (`{ type: "bold" }`, `{ type: "fontSizePx", size: "18" }`, ...).
    pub fn dispatch(&mut self, editor_id: &str, command: JsValue) -> Result<JsCommandOutcome, JsError> {
        let command: EditorCommand = serde_wasm_bindgen::from_value(command)
            .map_err(|e| JsError::new(&format!("Invalid command: {}", e)))?;
        self.capture_selection(editor_id)?;
        let outcome = self.mutate(editor_id, |inner, surface| inner.dispatch(surface, &command))?;
        Ok(JsCommandOutcome::from_outcome(outcome, &self.inner.config().messages))
    }

    #[wasm_bindgen(js_name = insertImageFromPicker)]
    pub fn insert_image_from_picker(
        &mut self,
        editor_id: &str,
        url: &str,
    ) -> Result<JsCommandOutcome, JsError> {
        self.capture_selection(editor_id)?;
        let outcome = self.mutate(editor_id, |inner, surface| {
            inner.insert_image_from_picker(surface, url)
        })?;
        Ok(JsCommandOutcome::from_outcome(outcome, &self.inner.config().messages))
    }

    /// `click` inside a toolbar.
    #[wasm_bindgen(js_name = onToolbarClick)]
    pub fn on_toolbar_click(
        &mut self,
        toolbar_id: &str,
        target: Node,
    ) -> Result<JsCommandOutcome, JsError> {
        let editor_id = self.editor_for_toolbar(toolbar_id)?;
        self.capture_selection(&editor_id)?;
        let target = self.core_target(&target);
        let outcome = self.mutate(&editor_id, |inner, _| inner.on_toolbar_click(toolbar_id, target))?;
        Ok(JsCommandOutcome::from_outcome(outcome, &self.inner.config().messages))
    }

    /// `change` on a toolbar `<select>`. The control is reset afterwards.
    #[wasm_bindgen(js_name = onToolbarChange)]
    pub fn on_toolbar_change(
        &mut self,
        toolbar_id: &str,
        target: Node,
    ) -> Result<JsCommandOutcome, JsError> {
        let editor_id = self.editor_for_toolbar(toolbar_id)?;
        let Some(select) = target.dyn_ref::<HtmlSelectElement>().cloned() else {
            return Ok(JsCommandOutcome::NoOp);
        };
        let value = select.value();
        self.capture_selection(&editor_id)?;
        let core = self.core_target(&target);
        let outcome = self.mutate(&editor_id, |inner, _| {
            inner.on_toolbar_change(toolbar_id, core, &value)
        })?;
        select.set_value("");
        Ok(JsCommandOutcome::from_outcome(outcome, &self.inner.config().messages))
    }

    /// `click` inside an editor. Returns whether an image is now selected.
    #[wasm_bindgen(js_name = onClick)]
    pub fn on_click(&mut self, editor_id: &str, target: Node) -> Result<bool, JsError> {
        let target = self.core_target(&target);
        let result = self.mutate(editor_id, |inner, surface| inner.on_click(surface, target))?;
        Ok(matches!(result, ClickResult::Selected(_)))
    }

    /// `mousedown` inside an editor.
    #[wasm_bindgen(js_name = onMouseDown)]
    pub fn on_mouse_down(&mut self, editor_id: &str, target: Node) -> Result<bool, JsError> {
        let target = self.core_target(&target);
        let image = self.mutate(editor_id, |inner, surface| {
            inner.on_pointer_down(surface, target)
        })?;
        if image.is_some() {
            self.render(editor_id)?;
        }
        Ok(image.is_some())
    }

    /// `mouseup`, `touchend` or `mouseleave` on a wrapper: store its rendered size.
    #[wasm_bindgen(js_name = onPointerUp)]
    pub fn on_pointer_up(&mut self, editor_id: &str, target: Node) -> Result<bool, JsError> {
        let Some(wrapper) = self.page_wrapper(&target)? else {
            return Ok(false);
        };
        let rect = wrapper.get_bounding_client_rect();
        let rect = WrapperRect::new(rect.width(), rect.height());
        let target = self.core_target(&target);
        self.mutate(editor_id, |inner, surface| {
            inner.on_pointer_up(surface, target, rect)
        })
    }

    /// `input` inside an editor: re-read the page's content and normalize it.
    #[wasm_bindgen(js_name = onInput)]
    pub fn on_input(&mut self, editor_id: &str) -> Result<(), JsError> {
        let mirror = self.mirror(editor_id)?;
        let html = mirror.editor.inner_html();
        let surface = mirror.surface.clone();
        let root = self.inner.surface_root(&surface).map_err(js_error)?;
        self.inner
            .document_mut()
            .set_inner_html(root, &html)
            .map_err(js_error)?;
        self.capture_selection(editor_id)?;
        self.inner.on_input(&surface).map_err(js_error)?;
        if self.inner.document().inner_html(root) != html {
            self.render(editor_id)?;
        }
        self.notify(editor_id);
        Ok(())
    }

    /// `keydown` inside an editor. Returns whether to prevent the default.
    #[wasm_bindgen(js_name = onKeydown)]
    pub fn on_keydown(&mut self, editor_id: &str, key: &str) -> Result<bool, JsError> {
        let key = Key::from_key_value(key);
        let dragging = self.drag_owner();
        self.capture_selection(editor_id)?;
        let result = self.mutate(editor_id, |inner, surface| inner.on_keydown(surface, &key))?;
        self.finish_drag(dragging)?;
        Ok(result == KeydownResult::Handled)
    }

    /// `dragstart` inside an editor. Returns whether a wrapper drag began.
    #[wasm_bindgen(js_name = onDragStart)]
    pub fn on_drag_start(
        &mut self,
        editor_id: &str,
        target: Node,
        transfer: Option<DataTransfer>,
    ) -> Result<bool, JsError> {
        let surface = self.mirror(editor_id)?.surface.clone();
        let core = self.core_target(&target);
        self.remove_ghost();
        let Some(start) = self.inner.drag_start(&surface, core).map_err(js_error)? else {
            return Ok(false);
        };
        let ghost = page_ghost()?;
        if let Some(transfer) = transfer {
            transfer.set_effect_allowed(start.effect_allowed);
            transfer
                .set_data(start.data_type, start.data)
                .map_err(page_error)?;
            transfer.set_drag_image(&ghost, 0, 0);
        }
        self.ghost = Some(ghost);
        Ok(true)
    }

    /// `dragover` on the page. Returns whether to prevent the default.
    #[wasm_bindgen(js_name = onDragOver)]
    pub fn on_drag_over(&mut self, target: Node) -> Result<bool, JsError> {
        let core = self.core_target(&target);
        let prevent = self.inner.drag_over(core);
        if !prevent {
            return Ok(false);
        }
        let classes = &self.inner.config().classes;
        let doc = self.inner.document();
        let hinted = doc
            .closest(core, |el| el.has_class(&classes.wrapper))
            .is_some_and(|w| doc.has_class(w, &classes.drag_over));
        if hinted {
            if let Some(wrapper) = self.page_wrapper(&target)? {
                wrapper
                    .class_list()
                    .add_1(&classes.drag_over)
                    .map_err(page_error)?;
            }
        }
        Ok(true)
    }

    #[wasm_bindgen(js_name = onDragLeave)]
    pub fn on_drag_leave(&mut self, target: Node) -> Result<(), JsError> {
        let core = self.core_target(&target);
        self.inner.drag_leave(core);
        if let Some(wrapper) = self.page_wrapper(&target)? {
            wrapper
                .class_list()
                .remove_1(&self.inner.config().classes.drag_over)
                .map_err(page_error)?;
        }
        Ok(())
    }

    /// `drop` on the page. `caret` is the caret under the pointer
    /// (from `caretRangeFromPoint`), if any. Returns whether to prevent the default.
    #[wasm_bindgen(js_name = onDrop)]
    pub fn on_drop(
        &mut self,
        target: Node,
        caret_node: Option<Node>,
        caret_offset: u32,
    ) -> Result<bool, JsError> {
        let owner = self.drag_owner();
        let core = self.core_target(&target);
        let caret = caret_node.and_then(|node| self.core_caret(&node, caret_offset));
        let result = self.inner.drop(core, caret);
        self.finish_drag(owner)?;
        Ok(result.prevent_default)
    }

    #[wasm_bindgen(js_name = onDragEnd)]
    pub fn on_drag_end(&mut self) -> Result<(), JsError> {
        let owner = self.drag_owner();
        self.inner.drag_end();
        self.finish_drag(owner)
    }

    /// Escape or window blur during a drag.
    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&mut self) -> Result<(), JsError> {
        let owner = self.drag_owner();
        self.inner.cancel_drag();
        self.finish_drag(owner)
    }

    /// The editor's content as persistable markup.
    pub fn serialize(&self, editor_id: &str) -> Result<String, JsError> {
        let mirror = self.mirror(editor_id)?;
        self.inner.serialize(&mirror.surface).map_err(js_error)
    }

    /// Load persisted markup into an editor.
    pub fn deserialize(&mut self, editor_id: &str, html: &str) -> Result<(), JsError> {
        self.mutate(editor_id, |inner, surface| inner.deserialize(surface, html))
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self, editor_id: &str) -> bool {
        self.mirrors
            .get(editor_id)
            .is_some_and(|m| self.inner.can_undo(&m.surface))
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self, editor_id: &str) -> bool {
        self.mirrors
            .get(editor_id)
            .is_some_and(|m| self.inner.can_redo(&m.surface))
    }
}

impl JsEditorSession {
    fn mirror(&self, editor_id: &str) -> Result<&Mirror, JsError> {
        self.mirrors
            .get(editor_id)
            .ok_or_else(|| JsError::new(&format!("Editor {} is not bound", editor_id)))
    }

    fn editor_for_toolbar(&self, toolbar_id: &str) -> Result<String, JsError> {
        self.mirrors
            .iter()
            .find(|(_, m)| m.toolbar_id == toolbar_id)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| JsError::new(&format!("Toolbar {} is not bound", toolbar_id)))
    }

    /// Forget mirrors of sections the page has replaced or is rebinding.
    fn drop_stale_mirrors(&mut self, toolbar_id: &str, editor_id: &str) {
        let stale: Vec<String> = self
            .mirrors
            .iter()
            .filter(|(id, m)| {
                id.as_str() == editor_id
                    || m.toolbar_id == toolbar_id
                    || !m.editor.is_connected()
                    || !m.toolbar.is_connected()
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            if let Some(mirror) = self.mirrors.remove(&id) {
                tracing::debug!(editor_id = %id, "dropping stale editor mirror");
                self.inner.document_mut().remove(mirror.container);
            }
        }
    }

    /// The mirror node for a page node. Nodes outside every bound pair map to the mirror body.
    fn core_target(&self, target: &Node) -> NodeId {
        let doc = self.inner.document();
        for mirror in self.mirrors.values() {
            let Some(surface) = self.inner.surface(&mirror.surface) else {
                continue;
            };
            let editor: &Node = mirror.editor.as_ref();
            let toolbar: &Node = mirror.toolbar.as_ref();
            for (page_scope, core_scope) in [(editor, surface.root), (toolbar, surface.toolbar)] {
                let found = path_from(page_scope, target)
                    .and_then(|path| core_node_at(doc, core_scope, &path));
                if let Some(node) = found {
                    return node;
                }
            }
        }
        doc.body().unwrap_or(doc.root())
    }

    fn core_caret(&self, node: &Node, offset: u32) -> Option<Position> {
        let doc = self.inner.document();
        self.mirrors.values().find_map(|mirror| {
            let root = self.inner.surface(&mirror.surface)?.root;
            let scope: &Node = mirror.editor.as_ref();
            core_position(doc, scope, root, node, offset)
        })
    }

    /// The wrapper element around a page node, if any.
    fn page_wrapper(&self, target: &Node) -> Result<Option<Element>, JsError> {
        let element = match target.dyn_ref::<Element>() {
            Some(el) => Some(el.clone()),
            None => target.parent_element(),
        };
        let Some(element) = element else {
            return Ok(None);
        };
        let selector = format!(".{}", self.inner.config().classes.wrapper);
        element.closest(&selector).map_err(page_error)
    }

    /// Mirror the page selection into the session, as far as it lies inside the editor.
    fn capture_selection(&mut self, editor_id: &str) -> Result<(), JsError> {
        let mirror = self.mirror(editor_id)?;
        let root = self.inner.surface_root(&mirror.surface).map_err(js_error)?;
        let Some(selection) = page_selection() else {
            return Ok(());
        };
        let doc = self.inner.document();
        let scope: &Node = mirror.editor.as_ref();
        let anchor = selection
            .anchor_node()
            .and_then(|n| core_position(doc, scope, root, &n, selection.anchor_offset()));
        let focus = selection
            .focus_node()
            .and_then(|n| core_position(doc, scope, root, &n, selection.focus_offset()));
        let mirrored = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(TextSelection::new(anchor, focus)),
            _ => None,
        };
        self.inner.set_selection(mirrored);
        Ok(())
    }

    /// Run `f` against an editor's surface and re-render it if its markup changed.
    fn mutate<T>(
        &mut self,
        editor_id: &str,
        f: impl FnOnce(&mut InnerSession, &SurfaceId) -> Result<T, EditorError>,
    ) -> Result<T, JsError> {
        let surface = self.mirror(editor_id)?.surface.clone();
        let root = self.inner.surface_root(&surface).map_err(js_error)?;
        let before = self.inner.document().inner_html(root);
        let result = f(&mut self.inner, &surface).map_err(js_error)?;
        if self.inner.document().inner_html(root) != before {
            self.render(editor_id)?;
            self.notify(editor_id);
        }
        Ok(result)
    }

    /// Write an editor's mirrored markup and selection back to the page.
    fn render(&self, editor_id: &str) -> Result<(), JsError> {
        let mirror = self.mirror(editor_id)?;
        let root = self.inner.surface_root(&mirror.surface).map_err(js_error)?;
        let doc = self.inner.document();
        let html = doc.inner_html(root);
        if mirror.editor.inner_html() != html {
            mirror.editor.set_inner_html(&html);
        }

        let Some(selection) = self.inner.selection() else {
            return Ok(());
        };
        if !doc.contains(root, selection.anchor.node) || !doc.contains(root, selection.focus.node) {
            return Ok(());
        }
        let scope: &Node = mirror.editor.as_ref();
        let anchor = page_position(doc, root, scope, selection.anchor);
        let focus = page_position(doc, root, scope, selection.focus);
        if let (Some((anchor, anchor_offset)), Some((focus, focus_offset)), Some(page)) =
            (anchor, focus, page_selection())
        {
            if let Err(e) = page.set_base_and_extent(&anchor, anchor_offset, &focus, focus_offset) {
                tracing::debug!(error = ?e, "restoring selection failed");
            }
        }
        Ok(())
    }

    fn notify(&self, editor_id: &str) {
        if let Some(callback) = &self.on_change {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(editor_id)) {
                tracing::warn!(error = ?e, editor_id, "change callback threw");
            }
        }
    }

    fn drag_owner(&self) -> Option<String> {
        self.inner
            .drag()
            .session()
            .map(|s| s.surface.as_str().to_string())
    }

    /// After a drag event: if the drag is over, drop the ghost and re-render its surface.
    fn finish_drag(&mut self, owner: Option<String>) -> Result<(), JsError> {
        if self.inner.drag().is_active() {
            return Ok(());
        }
        self.remove_ghost();
        let Some(owner) = owner else {
            return Ok(());
        };
        if self.mirrors.contains_key(&owner) {
            self.render(&owner)?;
            self.notify(&owner);
        }
        Ok(())
    }

    fn remove_ghost(&mut self) {
        if let Some(ghost) = self.ghost.take() {
            ghost.remove();
        }
    }
}

fn page_document() -> Result<web_sys::Document, JsError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsError::new("No document available"))
}

fn page_selection() -> Option<web_sys::Selection> {
    web_sys::window()?.get_selection().ok().flatten()
}

/// Invisible 1x1 element used as the drag image.
fn page_ghost() -> Result<Element, JsError> {
    let page = page_document()?;
    let ghost = page.create_element("div").map_err(page_error)?;
    ghost
        .set_attribute(
            "style",
            "width: 1px; height: 1px; opacity: 0; position: fixed; top: 0; left: 0;",
        )
        .map_err(page_error)?;
    let body = page
        .body()
        .ok_or_else(|| JsError::new("No body to hold the drag image"))?;
    body.append_child(&ghost).map_err(page_error)?;
    Ok(ghost)
}

fn js_error(e: impl fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn page_error(e: JsValue) -> JsError {
    JsError::new(&format!("{:?}", e))
}
