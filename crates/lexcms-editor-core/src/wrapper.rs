//! Image wrappers: the non-editable, draggable, resizable box around each image.
//!
//! A wrapper is `<span class="img-resizable" contenteditable="false"
//! draggable="true">` holding exactly one `<img>` and one delete button. It only
//! exists while editing; the serializer folds its state back onto the image.

use indextree::NodeId;

use crate::config::ClassNames;
use crate::dom::Document;
use crate::error::DomError;
use crate::types::{IMAGE_STATE_CLASSES, WrapperRect, format_px};

pub fn is_wrapper(doc: &Document, classes: &ClassNames, node: NodeId) -> bool {
    doc.is_tag(node, "span") && doc.has_class(node, &classes.wrapper)
}

/// The wrapper enclosing `image`, if any.
pub fn wrapper_of(doc: &Document, classes: &ClassNames, image: NodeId) -> Option<NodeId> {
    doc.closest(image, |el| el.has_class(&classes.wrapper))
}

/// The image inside a wrapper.
pub fn image_in(doc: &Document, wrapper: NodeId) -> Option<NodeId> {
    doc.query(wrapper, |el| el.is("img"))
}

/// Wrap `image`, or return its existing wrapper.
pub fn ensure_wrapped(
    doc: &mut Document,
    classes: &ClassNames,
    image: NodeId,
) -> Result<NodeId, DomError> {
    if !doc.is_tag(image, "img") {
        return Err(DomError::WrongElement { expected: "img" });
    }
    if let Some(existing) = wrapper_of(doc, classes, image) {
        return Ok(existing);
    }
    let parent = doc.parent(image).ok_or(DomError::Detached)?;

    let wrapper = doc.create_element("span");
    doc.add_class(wrapper, &classes.wrapper);
    doc.set_attr(wrapper, "contenteditable", "false");
    doc.set_attr(wrapper, "draggable", "true");
    doc.insert_before(parent, wrapper, Some(image))?;
    doc.append(wrapper, image)?;
    doc.set_attr(image, "draggable", "true");

    let button = doc.create_element("button");
    doc.set_attr(button, "type", "button");
    doc.add_class(button, &classes.delete_button);
    let label = doc.create_text("×");
    doc.append(button, label)?;
    doc.append(wrapper, button)?;

    for class in IMAGE_STATE_CLASSES {
        if doc.has_class(image, class) {
            doc.add_class(wrapper, class);
        }
    }
    apply_saved_size(doc, image, wrapper);

    tracing::debug!(?image, ?wrapper, "wrapped image");
    Ok(wrapper)
}

/// Wrap every image under `scope`. Returns the wrappers in document order.
pub fn ensure_resizable_images(
    doc: &mut Document,
    classes: &ClassNames,
    scope: NodeId,
) -> Result<Vec<NodeId>, DomError> {
    doc.query_all(scope, |el| el.is("img"))
        .into_iter()
        .map(|image| ensure_wrapped(doc, classes, image))
        .collect()
}

/// A saved dimension: `data-img-*`, else inline style, else the legacy attribute.
fn saved_dimension(doc: &Document, image: NodeId, dimension: &str) -> Option<String> {
    let el = doc.element(image)?;
    let non_empty = |v: &str| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    };
    el.data(&format!("img-{dimension}"))
        .and_then(non_empty)
        .or_else(|| el.style(dimension).as_deref().and_then(non_empty))
        .or_else(|| el.attr(dimension).and_then(non_empty).map(legacy_length))
}

/// Legacy `width="240"` attributes are unitless pixels.
fn legacy_length(value: String) -> String {
    if value.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        format!("{value}px")
    } else {
        value
    }
}

fn apply_saved_size(doc: &mut Document, image: NodeId, wrapper: NodeId) {
    let width = saved_dimension(doc, image, "width");
    let height = saved_dimension(doc, image, "height");

    match &width {
        Some(w) => {
            doc.set_style(wrapper, "width", w);
            doc.set_style(image, "width", w);
        }
        None => {
            doc.set_style(image, "width", "100%");
            doc.set_style(wrapper, "width", "100%");
        }
    }
    if let Some(h) = &height {
        doc.set_style(wrapper, "height", h);
        doc.set_style(image, "height", h);
    }
    if doc.style(image, "height").is_none() {
        doc.set_style(image, "height", "auto");
    }
}

/// Write a wrapper's rendered size back after a resize gesture.
pub fn sync_size(
    doc: &mut Document,
    wrapper: NodeId,
    rect: WrapperRect,
    min_tracked_height_px: f64,
) {
    let Some(image) = image_in(doc, wrapper) else {
        return;
    };
    if rect.width > 0.0 {
        let width = format_px(rect.width);
        doc.set_style(wrapper, "width", &width);
        doc.set_style(image, "width", &width);
        if let Some(el) = doc.element_mut(image) {
            el.set_data("img-width", width);
        }
    }
    if rect.height > min_tracked_height_px {
        let height = format_px(rect.height);
        doc.set_style(wrapper, "height", &height);
        doc.set_style(image, "height", &height);
        if let Some(el) = doc.element_mut(image) {
            el.set_data("img-height", height);
        }
    } else {
        doc.set_style(wrapper, "height", "auto");
        if doc.style(image, "height").is_none() {
            doc.set_style(image, "height", "auto");
        }
    }
    tracing::trace!(?wrapper, width = rect.width, height = rect.height, "synced wrapper size");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(html: &str) -> (Document, NodeId, ClassNames) {
        let doc = Document::parse(&format!("<div id=\"s\">{html}</div>"));
        let s = doc.get_element_by_id("s").unwrap();
        (doc, s, ClassNames::default())
    }

    #[test]
    fn test_ensure_wrapped_builds_wrapper() {
        let (mut doc, s, classes) = setup("<img src=\"https://x/y.png\" class=\"img-align-left\">");
        let img = doc.query(s, |el| el.is("img")).unwrap();
        let wrapper = ensure_wrapped(&mut doc, &classes, img).unwrap();
        assert_eq!(
            doc.inner_html(s),
            "<span class=\"img-resizable img-align-left\" contenteditable=\"false\" draggable=\"true\" style=\"width: 100%;\">\
             <img src=\"https://x/y.png\" class=\"img-align-left\" draggable=\"true\" style=\"width: 100%; height: auto;\">\
             <button type=\"button\" class=\"img-delete\">×</button></span>"
        );
        assert_eq!(doc.parent(img), Some(wrapper));
    }

    #[test]
    fn test_ensure_wrapped_is_idempotent() {
        let (mut doc, s, classes) = setup("<p>a<img src=\"https://x/y.png\">b</p>");
        let img = doc.query(s, |el| el.is("img")).unwrap();
        let first = ensure_wrapped(&mut doc, &classes, img).unwrap();
        let html = doc.inner_html(s);
        let second = ensure_wrapped(&mut doc, &classes, img).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.inner_html(s), html);
        ensure_resizable_images(&mut doc, &classes, s).unwrap();
        assert_eq!(doc.inner_html(s), html);
        assert_eq!(doc.query_all(s, |el| el.has_class("img-resizable")).len(), 1);
    }

    #[test]
    fn test_saved_size_precedence() {
        let (mut doc, s, classes) = setup(
            "<img src=\"https://x/a.png\" data-img-width=\"300px\" style=\"width: 120px;\" width=\"50\">\
             <img src=\"https://x/b.png\" width=\"50\" height=\"40\">",
        );
        let wrappers = ensure_resizable_images(&mut doc, &classes, s).unwrap();
        assert_eq!(doc.style(wrappers[0], "width").as_deref(), Some("300px"));
        assert_eq!(doc.style(wrappers[1], "width").as_deref(), Some("50px"));
        assert_eq!(doc.style(wrappers[1], "height").as_deref(), Some("40px"));
        let b = image_in(&doc, wrappers[1]).unwrap();
        assert_eq!(doc.style(b, "height").as_deref(), Some("40px"));
    }

    #[test]
    fn test_sync_size_tracks_rendered_box() {
        let (mut doc, s, classes) = setup("<img src=\"https://x/y.png\">");
        let img = doc.query(s, |el| el.is("img")).unwrap();
        let wrapper = ensure_wrapped(&mut doc, &classes, img).unwrap();

        sync_size(&mut doc, wrapper, WrapperRect::new(240.0, 180.0), 4.0);
        assert_eq!(doc.style(wrapper, "width").as_deref(), Some("240px"));
        assert_eq!(doc.attr(img, "data-img-width"), Some("240px"));
        assert_eq!(doc.attr(img, "data-img-height"), Some("180px"));

        sync_size(&mut doc, wrapper, WrapperRect::new(240.0, 3.0), 4.0);
        assert_eq!(doc.style(wrapper, "height").as_deref(), Some("auto"));
        // The image keeps its last tracked height.
        assert_eq!(doc.style(img, "height").as_deref(), Some("180px"));
    }

    #[test]
    fn test_ensure_wrapped_rejects_non_image() {
        let (mut doc, s, classes) = setup("<p>x</p>");
        let p = doc.first_child(s).unwrap();
        assert_eq!(
            ensure_wrapped(&mut doc, &classes, p),
            Err(DomError::WrongElement { expected: "img" })
        );
    }
}
