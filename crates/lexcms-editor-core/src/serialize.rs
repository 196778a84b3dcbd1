//! Persisted markup: wrappers in, wrappers out.
//!
//! Stored content never contains editor scaffolding. Serializing folds each
//! wrapper's placement and size back onto its `<img>`; deserializing rebuilds
//! the wrappers from those same attributes.

use indextree::NodeId;

use crate::config::ClassNames;
use crate::dom::Document;
use crate::error::{DomError, EditorError};
use crate::platform::EditorHost;
use crate::session::EditorSession;
use crate::types::{IMAGE_STATE_CLASSES, SurfaceId};
use crate::wrapper::image_in;

/// Markup for the children of `root`, without wrappers. `doc` is not modified.
pub fn serialize_surface(doc: &Document, classes: &ClassNames, root: NodeId) -> String {
    let mut copy = Document::new();
    let host = copy.root();
    copy.import_children(doc, root, host);

    for wrapper in copy.query_all(host, |el| el.has_class(&classes.wrapper)) {
        if !copy.contains(host, wrapper) {
            continue;
        }
        if let Err(e) = unwrap_image(&mut copy, classes, wrapper) {
            tracing::warn!(error = %e, "dropping wrapper that could not be unwrapped");
            copy.remove(wrapper);
        }
    }
    for button in copy.query_all(host, |el| el.has_class(&classes.delete_button)) {
        copy.remove(button);
    }
    copy.inner_html(host)
}

fn unwrap_image(
    copy: &mut Document,
    classes: &ClassNames,
    wrapper: NodeId,
) -> Result<(), DomError> {
    let Some(image) = image_in(copy, wrapper) else {
        copy.remove(wrapper);
        return Ok(());
    };
    for class in IMAGE_STATE_CLASSES {
        if copy.has_class(wrapper, class) {
            copy.add_class(image, class);
        }
    }
    let width = copy
        .style(wrapper, "width")
        .or_else(|| copy.style(wrapper, "max-width"));
    if let Some(width) = width {
        copy.set_style(image, "width", &width);
        copy.set_attr(image, "data-img-width", width);
    }
    if let Some(height) = copy.style(wrapper, "height") {
        copy.set_style(image, "height", &height);
        copy.set_attr(image, "data-img-height", height);
    }
    if copy.style(image, "max-width").is_none() {
        copy.set_style(image, "max-width", "100%");
    }
    copy.remove_attr(image, "draggable");
    copy.remove_class(image, &classes.selected);
    copy.replace_with(wrapper, image)
}

impl<H: EditorHost> EditorSession<H> {
    /// The surface's content as persistable markup.
    pub fn serialize(&self, surface: &SurfaceId) -> Result<String, EditorError> {
        let root = self.surface_root(surface)?;
        Ok(serialize_surface(&self.doc, &self.config.classes, root))
    }

    /// Load persisted markup into a surface and rebuild its wrappers.
    ///
    /// Image selection, drag state and undo history for the surface are reset.
    pub fn deserialize(&mut self, surface: &SurfaceId, html: &str) -> Result<(), EditorError> {
        let root = self.surface_root(surface)?;
        self.reset_transient(surface, root);
        self.doc.set_inner_html(root, html)?;
        if let Some(s) = self.surfaces.get_mut(surface) {
            s.history.clear();
        }
        self.normalize(root);
        tracing::debug!(%surface, len = html.len(), "surface content loaded");
        Ok(())
    }
}
