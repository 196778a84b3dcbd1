//! Surface event entry points: pointer, keyboard, input and drag-and-drop.
//!
//! The platform layer forwards DOM events here with the event target
//! translated to a node in the session's document.

use indextree::NodeId;
use smol_str::SmolStr;

use crate::drag::{DragStart, DropOutcome, DropResult};
use crate::error::EditorError;
use crate::platform::EditorHost;
use crate::range::{Position, TextSelection};
use crate::session::EditorSession;
use crate::types::{SurfaceId, WrapperRect};
use crate::wrapper::{image_in, sync_size, wrapper_of};

/// The keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Backspace,
    Delete,
    Escape,
    Enter,
    /// A printable character.
    Character(SmolStr),
    /// Anything else, by its `KeyboardEvent.key` name.
    Other(SmolStr),
}

impl Key {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_key_value(value: &str) -> Self {
        match value {
            "Backspace" => Self::Backspace,
            "Delete" | "Del" => Self::Delete,
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            v if v.chars().count() == 1 => Self::Character(SmolStr::new(v)),
            v => Self::Other(SmolStr::new(v)),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Let the platform handle it.
    NotHandled,
}

/// What a click inside a surface did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickResult {
    /// An image was selected.
    Selected(NodeId),
    /// The click missed every image; the surface's image selection was cleared.
    Cleared,
    /// A delete button was clicked and its image removed.
    Removed(NodeId),
}

impl<H: EditorHost> EditorSession<H> {
    /// The image a pointer event on `target` refers to: the image itself or the one in its wrapper.
    fn image_under(&self, root: NodeId, target: NodeId) -> Option<NodeId> {
        let classes = &self.config.classes;
        let image = self
            .doc
            .closest_within(target, root, |el| el.is("img"))
            .or_else(|| {
                self.doc
                    .closest_within(target, root, |el| el.has_class(&classes.wrapper))
                    .and_then(|w| image_in(&self.doc, w))
            });
        image.filter(|&img| self.doc.contains(root, img))
    }

    pub fn on_click(&mut self, surface: &SurfaceId, target: NodeId) -> Result<ClickResult, EditorError> {
        let root = self.surface_root(surface)?;
        let classes = &self.config.classes;
        let delete_button = self
            .doc
            .closest_within(target, root, |el| el.has_class(&classes.delete_button));
        if let Some(button) = delete_button {
            let image = self
                .doc
                .closest_within(button, root, |el| el.has_class(&classes.wrapper))
                .and_then(|w| image_in(&self.doc, w));
            if let Some(image) = image {
                self.remove_image(surface, image)?;
                return Ok(ClickResult::Removed(image));
            }
        }
        let picked = self.image_under(root, target);
        match self.select_image(surface, picked)? {
            Some(image) => Ok(ClickResult::Selected(image)),
            None => Ok(ClickResult::Cleared),
        }
    }

    /// Pressing on an image selects it and puts the text selection around its wrapper.
    pub fn on_pointer_down(
        &mut self,
        surface: &SurfaceId,
        target: NodeId,
    ) -> Result<Option<NodeId>, EditorError> {
        let root = self.surface_root(surface)?;
        let Some(image) = self.image_under(root, target) else {
            return Ok(None);
        };
        let Some(wrapper) = wrapper_of(&self.doc, &self.config.classes, image) else {
            return Ok(None);
        };
        self.select_image(surface, Some(image))?;
        self.selection = TextSelection::select_node(&self.doc, wrapper);
        Ok(Some(image))
    }

    /// Pointer release, touch end or mouse leave over a wrapper: record its rendered size.
    pub fn on_pointer_up(
        &mut self,
        surface: &SurfaceId,
        target: NodeId,
        rect: WrapperRect,
    ) -> Result<bool, EditorError> {
        let root = self.surface_root(surface)?;
        let wrapper = self
            .doc
            .closest_within(target, root, |el| el.has_class(&self.config.classes.wrapper));
        let Some(wrapper) = wrapper else {
            return Ok(false);
        };
        sync_size(&mut self.doc, wrapper, rect, self.config.min_tracked_height_px);
        Ok(true)
    }

    /// Content typed or pasted: wrap new images and fix link targets.
    pub fn on_input(&mut self, surface: &SurfaceId) -> Result<(), EditorError> {
        let root = self.surface_root(surface)?;
        self.normalize(root);
        Ok(())
    }

    pub fn on_keydown(&mut self, surface: &SurfaceId, key: &Key) -> Result<KeydownResult, EditorError> {
        match key {
            Key::Escape if self.drag.is_active() => {
                self.cancel_drag();
                Ok(KeydownResult::Handled)
            }
            Key::Backspace | Key::Delete => match self.resolve_image(surface) {
                Some(image) => {
                    self.remove_image(surface, image)?;
                    Ok(KeydownResult::Handled)
                }
                None => Ok(KeydownResult::NotHandled),
            },
            _ => Ok(KeydownResult::NotHandled),
        }
    }

    /// Root of the bound surface containing `node`.
    fn surface_root_at(&self, node: NodeId) -> Option<NodeId> {
        self.surfaces
            .values()
            .map(|s| s.root)
            .find(|&root| self.doc.is_connected(root) && self.doc.contains(root, node))
    }

    /// `dragstart` inside a surface.
    pub fn drag_start(
        &mut self,
        surface: &SurfaceId,
        target: NodeId,
    ) -> Result<Option<DragStart>, EditorError> {
        let root = self.surface_root(surface)?;
        Ok(self
            .drag
            .start(&mut self.doc, &self.config.classes, surface, root, target)?)
    }

    /// `dragover` anywhere on the page. Returns whether to prevent the default.
    pub fn drag_over(&mut self, target: NodeId) -> bool {
        let target_surface = self.surface_root_at(target);
        self.drag
            .over(&mut self.doc, &self.config.classes, target_surface, target)
    }

    pub fn drag_leave(&mut self, target: NodeId) {
        self.drag.leave(&mut self.doc, &self.config.classes, target);
    }

    /// `drop` anywhere on the page. `caret` is the caret position under the pointer, if known.
    pub fn drop(&mut self, target: NodeId, caret: Option<Position>) -> DropResult {
        let target_surface = self.surface_root_at(target);
        self.drag
            .drop(&mut self.doc, &self.config.classes, target_surface, target, caret)
    }

    /// `dragend`: roll back if nothing consumed the drag.
    pub fn drag_end(&mut self) -> Option<DropOutcome> {
        self.drag.end(&mut self.doc, &self.config.classes)
    }

    /// Escape or window blur during a drag.
    pub fn cancel_drag(&mut self) -> Option<DropOutcome> {
        self.drag.cancel(&mut self.doc, &self.config.classes)
    }
}
