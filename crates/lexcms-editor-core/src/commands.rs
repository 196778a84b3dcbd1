//! Toolbar commands and their dispatch.
//!
//! Every toolbar interaction is parsed into an [`EditorCommand`] and handled
//! by [`EditorSession::dispatch`]. Invalid user input is rejected with a
//! notice through the host and never reaches the document.

use indextree::NodeId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::config::Messages;
use crate::edit::{
    EditOp, FORMAT_BLOCK_TAGS, InlineStyle, InlineWrap, ListKind, apply_edit, closest_block,
};
use crate::error::EditorError;
use crate::links::{enclosing_anchor, ensure_link_targets};
use crate::platform::EditorHost;
use crate::range::{DomRange, TextSelection};
use crate::sanitize::{is_http_url, is_safe_link_url};
use crate::session::EditorSession;
use crate::types::{Alignment, IMAGE_STATE_CLASSES, SurfaceId, WrapMode};
use crate::wrapper::ensure_wrapped;

/// A toolbar command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorCommand {
    Bold,
    Italic,
    Underline,
    #[serde(rename = "insertUnorderedList")]
    UnorderedList,
    #[serde(rename = "insertOrderedList")]
    OrderedList,
    RemoveFormat,
    /// Link the selection. Without a URL the host is prompted.
    CreateLink { url: Option<String> },
    Unlink,
    /// Insert an image. Without a URL the host is prompted.
    InsertImage { url: Option<String> },
    WrapSquare,
    WrapBlock,
    AlignLeft,
    AlignCenter,
    AlignRight,
    TextAlignLeft,
    TextAlignCenter,
    TextAlignRight,
    StyleTitle,
    StyleSubtitle,
    FontSizePx { size: String },
    FormatBlock { tag: String },
    Undo,
    Redo,
}

impl EditorCommand {
    /// Parse a toolbar control's `data-cmd` and `data-value`.
    pub fn from_toolbar(cmd: &str, value: Option<&str>) -> Option<Self> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let command = match cmd {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "insertUnorderedList" => Self::UnorderedList,
            "insertOrderedList" => Self::OrderedList,
            "removeFormat" => Self::RemoveFormat,
            "createLink" => Self::CreateLink {
                url: value.map(String::from),
            },
            "unlink" => Self::Unlink,
            "insertImage" => Self::InsertImage {
                url: value.map(String::from),
            },
            "wrapSquare" => Self::WrapSquare,
            "wrapBlock" => Self::WrapBlock,
            "alignLeft" => Self::AlignLeft,
            "alignCenter" => Self::AlignCenter,
            "alignRight" => Self::AlignRight,
            "textAlignLeft" => Self::TextAlignLeft,
            "textAlignCenter" => Self::TextAlignCenter,
            "textAlignRight" => Self::TextAlignRight,
            "styleTitle" => Self::StyleTitle,
            "styleSubtitle" => Self::StyleSubtitle,
            "fontSizePx" => Self::FontSizePx {
                size: value?.to_string(),
            },
            "formatBlock" => Self::FormatBlock {
                tag: value.unwrap_or("p").to_string(),
            },
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            _ => return None,
        };
        Some(command)
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The surface changed (or the command ran to completion).
    Applied,
    /// Nothing to do: no selection, a cancelled prompt, an unknown control.
    NoOp,
    /// User input was refused and the notice was shown.
    Rejected(Notice),
}

/// User-facing rejection notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    SelectImage,
    InvalidImageUrl,
    InvalidLinkUrl,
    InvalidFontSize,
}

impl Notice {
    pub fn message(self, messages: &Messages) -> &str {
        match self {
            Notice::SelectImage => &messages.select_image_first,
            Notice::InvalidImageUrl => &messages.invalid_image_url,
            Notice::InvalidLinkUrl => &messages.invalid_link_url,
            Notice::InvalidFontSize => &messages.invalid_font_size,
        }
    }
}

impl<H: EditorHost> EditorSession<H> {
    /// Run a command against a surface.
    ///
    /// Mutating commands are recorded in the surface's undo history and leave
    /// every anchor in the surface opening in a new tab.
    pub fn dispatch(
        &mut self,
        surface: &SurfaceId,
        command: &EditorCommand,
    ) -> Result<CommandOutcome, EditorError> {
        let root = self.surface_root(surface)?;
        tracing::trace!(%surface, ?command, "dispatching command");
        match command {
            EditorCommand::Undo => return Ok(applied_if(self.undo(surface)?)),
            EditorCommand::Redo => return Ok(applied_if(self.redo(surface)?)),
            _ => {}
        }

        let before = self.doc.inner_html(root);
        let outcome = self.run(surface, root, command)?;
        match outcome {
            CommandOutcome::Rejected(notice) => {
                tracing::debug!(%surface, ?notice, "command rejected");
                self.host.alert(notice.message(&self.config.messages));
            }
            CommandOutcome::Applied => {
                ensure_link_targets(&mut self.doc, root);
                if self.doc.inner_html(root) != before {
                    if let Some(s) = self.surfaces.get_mut(surface) {
                        s.history.record(before);
                    }
                }
            }
            CommandOutcome::NoOp => {}
        }
        Ok(outcome)
    }

    /// Insert an image chosen in the media library.
    ///
    /// Same validation and placement as the toolbar's `insertImage`.
    pub fn insert_image_from_picker(
        &mut self,
        surface: &SurfaceId,
        url: &str,
    ) -> Result<CommandOutcome, EditorError> {
        self.dispatch(
            surface,
            &EditorCommand::InsertImage {
                url: Some(url.to_string()),
            },
        )
    }

    /// Handle a click inside a toolbar.
    pub fn on_toolbar_click(
        &mut self,
        toolbar_id: &str,
        target: NodeId,
    ) -> Result<CommandOutcome, EditorError> {
        let surface = self.toolbar_surface(toolbar_id)?;
        let toolbar = self.toolbar_node(&surface)?;
        let button = self
            .doc
            .closest(target, |el| el.is("button") && el.has_attr("data-cmd"))
            .filter(|&b| self.doc.contains(toolbar, b));
        let Some(button) = button else {
            return Ok(CommandOutcome::NoOp);
        };
        let cmd = self.doc.attr(button, "data-cmd").unwrap_or_default().to_string();
        let value = self.doc.attr(button, "data-value").map(str::to_string);
        match EditorCommand::from_toolbar(&cmd, value.as_deref()) {
            Some(command) => self.dispatch(&surface, &command),
            None => {
                tracing::debug!(%cmd, "unknown toolbar command");
                Ok(CommandOutcome::NoOp)
            }
        }
    }

    /// Handle a `change` on a toolbar `<select>`. Only the font size picker reacts.
    ///
    /// `value` is the control's current value; the caller resets the control afterwards.
    pub fn on_toolbar_change(
        &mut self,
        toolbar_id: &str,
        target: NodeId,
        value: &str,
    ) -> Result<CommandOutcome, EditorError> {
        let surface = self.toolbar_surface(toolbar_id)?;
        let toolbar = self.toolbar_node(&surface)?;
        let select = self
            .doc
            .closest(target, |el| el.is("select") && el.has_attr("data-cmd"))
            .filter(|&s| self.doc.contains(toolbar, s));
        let Some(select) = select else {
            return Ok(CommandOutcome::NoOp);
        };
        if self.doc.attr(select, "data-cmd") != Some("fontSizePx") {
            return Ok(CommandOutcome::NoOp);
        }
        match EditorCommand::from_toolbar("fontSizePx", Some(value)) {
            Some(command) => self.dispatch(&surface, &command),
            None => Ok(CommandOutcome::NoOp),
        }
    }

    fn toolbar_node(&self, surface: &SurfaceId) -> Result<NodeId, EditorError> {
        self.surfaces
            .get(surface)
            .map(|s| s.toolbar)
            .ok_or_else(|| EditorError::UnknownSurface(surface.clone()))
    }

    fn run(
        &mut self,
        surface: &SurfaceId,
        root: NodeId,
        command: &EditorCommand,
    ) -> Result<CommandOutcome, EditorError> {
        use EditorCommand as C;
        match command {
            C::Bold => self.edit_selection(root, EditOp::ToggleInlineStyle(InlineStyle::Bold)),
            C::Italic => self.edit_selection(root, EditOp::ToggleInlineStyle(InlineStyle::Italic)),
            C::Underline => {
                self.edit_selection(root, EditOp::ToggleInlineStyle(InlineStyle::Underline))
            }
            C::UnorderedList => self.edit_selection(root, EditOp::ToggleList(ListKind::Unordered)),
            C::OrderedList => self.edit_selection(root, EditOp::ToggleList(ListKind::Ordered)),
            C::RemoveFormat => self.edit_selection(root, EditOp::RemoveFormat),
            C::Unlink => self.edit_selection(root, EditOp::Unlink),
            C::CreateLink { url } => self.create_link(root, url.as_deref()),
            C::InsertImage { url } => {
                let url = match url {
                    Some(url) => url.clone(),
                    None => match self.host.prompt(&self.config.messages.image_prompt, "https://") {
                        Some(url) => url,
                        None => return Ok(CommandOutcome::NoOp),
                    },
                };
                self.insert_image(surface, root, &url)
            }
            C::WrapSquare => self.wrap_image(surface, WrapMode::Square),
            C::WrapBlock => self.wrap_image(surface, WrapMode::Block),
            C::AlignLeft => self.align_resolved(surface, root, Alignment::Left),
            C::AlignCenter => self.align_resolved(surface, root, Alignment::Center),
            C::AlignRight => self.align_resolved(surface, root, Alignment::Right),
            C::TextAlignLeft => self.text_align(surface, root, Alignment::Left),
            C::TextAlignCenter => self.text_align(surface, root, Alignment::Center),
            C::TextAlignRight => self.text_align(surface, root, Alignment::Right),
            C::StyleTitle => {
                let add = self.config.classes.title.clone();
                let drop = self.config.classes.subtitle.clone();
                self.style_text(root, &add, &drop)
            }
            C::StyleSubtitle => {
                let add = self.config.classes.subtitle.clone();
                let drop = self.config.classes.title.clone();
                self.style_text(root, &add, &drop)
            }
            C::FontSizePx { size } => {
                let Some(px) = self.config.font_size.parse(size) else {
                    return Ok(CommandOutcome::Rejected(Notice::InvalidFontSize));
                };
                let range = self.selection_or_end(root);
                let wrap = InlineWrap::span_with_style("font-size", &format!("{px}px"));
                self.edit(root, range, EditOp::WrapInline(wrap))
            }
            C::FormatBlock { tag } => {
                let tag = tag
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_ascii_lowercase();
                if !FORMAT_BLOCK_TAGS.contains(&tag.as_str()) {
                    tracing::debug!(tag, "unsupported block format");
                    return Ok(CommandOutcome::NoOp);
                }
                self.edit_selection(root, EditOp::FormatBlock(SmolStr::new(tag)))
            }
            C::Undo | C::Redo => Ok(CommandOutcome::NoOp),
        }
    }

    /// Apply an edit to a range and adopt the selection it reports.
    fn edit(
        &mut self,
        root: NodeId,
        range: DomRange,
        op: EditOp,
    ) -> Result<CommandOutcome, EditorError> {
        if let Some(selection) = apply_edit(&mut self.doc, &self.config.classes, root, range, &op)? {
            self.selection = Some(selection);
        }
        Ok(CommandOutcome::Applied)
    }

    /// Apply an edit to the selection, if the selection is inside the surface.
    fn edit_selection(&mut self, root: NodeId, op: EditOp) -> Result<CommandOutcome, EditorError> {
        match self.selection_in(root) {
            Some(range) => self.edit(root, range, op),
            None => Ok(CommandOutcome::NoOp),
        }
    }

    fn create_link(&mut self, root: NodeId, url: Option<&str>) -> Result<CommandOutcome, EditorError> {
        let Some(range) = self.selection_in(root) else {
            return Ok(CommandOutcome::NoOp);
        };
        let url = match url {
            Some(url) => url.to_string(),
            None => {
                let current = self
                    .selection()
                    .and_then(|s| enclosing_anchor(&self.doc, s.anchor.node, root))
                    .and_then(|a| self.doc.attr(a, "href"))
                    .unwrap_or("https://")
                    .to_string();
                match self.host.prompt(&self.config.messages.link_prompt, &current) {
                    Some(url) => url,
                    None => return Ok(CommandOutcome::NoOp),
                }
            }
        };
        let url = url.trim();
        if url.is_empty() {
            return Ok(CommandOutcome::NoOp);
        }
        if !is_safe_link_url(url) {
            return Ok(CommandOutcome::Rejected(Notice::InvalidLinkUrl));
        }
        self.edit(root, range, EditOp::InsertLink { url: url.to_string() })
    }

    fn insert_image(
        &mut self,
        surface: &SurfaceId,
        root: NodeId,
        url: &str,
    ) -> Result<CommandOutcome, EditorError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(CommandOutcome::NoOp);
        }
        if !is_http_url(url) {
            return Ok(CommandOutcome::Rejected(Notice::InvalidImageUrl));
        }
        let range = self.selection_or_end(root);
        let image = self.doc.create_element("img");
        self.doc.set_attr(image, "src", url);
        self.edit(root, range, EditOp::InsertNode(image))?;

        let classes = &self.config.classes;
        let wrapper = ensure_wrapped(&mut self.doc, classes, image)?;
        for node in [image, wrapper] {
            self.doc.add_class(node, Alignment::Center.class());
        }
        self.doc.set_style(image, "max-width", "100%");
        self.doc.set_style(image, "height", "auto");
        self.doc.set_style(wrapper, "max-width", "100%");
        self.tracker
            .select(&mut self.doc, classes, surface, root, Some(image));
        tracing::debug!(%surface, url, "image inserted");
        Ok(CommandOutcome::Applied)
    }

    /// Switch the resolved image between square and block wrapping.
    fn wrap_image(&mut self, surface: &SurfaceId, mode: WrapMode) -> Result<CommandOutcome, EditorError> {
        let Some(image) = self.resolve_image(surface) else {
            return Ok(CommandOutcome::Rejected(Notice::SelectImage));
        };
        let root = self.surface_root(surface)?;
        let wrapper = ensure_wrapped(&mut self.doc, &self.config.classes, image)?;
        let alignment = Alignment::ALL
            .into_iter()
            .find(|a| self.doc.has_class(wrapper, a.class()) || self.doc.has_class(image, a.class()))
            .or_else(|| self.block_alignment(wrapper, root));
        for node in [wrapper, image] {
            for class in IMAGE_STATE_CLASSES {
                self.doc.remove_class(node, class);
            }
            self.doc.add_class(node, mode.class());
            if let (WrapMode::Square, Some(alignment)) = (mode, alignment) {
                self.doc.add_class(node, alignment.class());
            }
        }
        Ok(CommandOutcome::Applied)
    }

    /// `text-align` of the block around `node`, as an image alignment.
    fn block_alignment(&self, node: NodeId, root: NodeId) -> Option<Alignment> {
        let block = closest_block(&self.doc, node, root)?;
        self.doc
            .style(block, "text-align")
            .and_then(|v| Alignment::from_css(&v))
    }

    fn align_resolved(
        &mut self,
        surface: &SurfaceId,
        root: NodeId,
        alignment: Alignment,
    ) -> Result<CommandOutcome, EditorError> {
        match self.resolve_image(surface) {
            Some(image) => self.align_image(root, image, alignment),
            None => Ok(CommandOutcome::Rejected(Notice::SelectImage)),
        }
    }

    /// Exclusive alignment class on image and wrapper, plus justification of the wrapper's line.
    fn align_image(
        &mut self,
        root: NodeId,
        image: NodeId,
        alignment: Alignment,
    ) -> Result<CommandOutcome, EditorError> {
        let wrapper = ensure_wrapped(&mut self.doc, &self.config.classes, image)?;
        for node in [wrapper, image] {
            for other in Alignment::ALL {
                self.doc.remove_class(node, other.class());
            }
            self.doc.add_class(node, alignment.class());
        }
        if let Some(around) = TextSelection::select_node(&self.doc, wrapper) {
            let range = around.to_range(&self.doc);
            self.edit(root, range, EditOp::Justify(alignment))?;
        }
        Ok(CommandOutcome::Applied)
    }

    /// Image alignment when an image is resolved, else paragraph justification.
    fn text_align(
        &mut self,
        surface: &SurfaceId,
        root: NodeId,
        alignment: Alignment,
    ) -> Result<CommandOutcome, EditorError> {
        if let Some(image) = self.resolve_image(surface) {
            return self.align_image(root, image, alignment);
        }
        let range = self.selection_or_end(root);
        self.edit(root, range, EditOp::Justify(alignment))
    }

    /// Put a text class on the enclosing block, or wrap the selection in a span carrying it.
    fn style_text(&mut self, root: NodeId, add: &str, drop: &str) -> Result<CommandOutcome, EditorError> {
        let Some(range) = self.selection_in(root) else {
            return Ok(CommandOutcome::NoOp);
        };
        let anchor = self.selection().map_or(range.start, |s| s.anchor);
        if let Some(block) = closest_block(&self.doc, anchor.node, root) {
            self.doc.remove_class(block, drop);
            self.doc.add_class(block, add);
            return Ok(CommandOutcome::Applied);
        }
        self.edit(root, range, EditOp::WrapInline(InlineWrap::span_with_class(add)))
    }
}

fn applied_if(changed: bool) -> CommandOutcome {
    if changed {
        CommandOutcome::Applied
    } else {
        CommandOutcome::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toolbar_parses_known_commands() {
        assert_eq!(EditorCommand::from_toolbar("bold", None), Some(EditorCommand::Bold));
        assert_eq!(
            EditorCommand::from_toolbar("insertOrderedList", None),
            Some(EditorCommand::OrderedList)
        );
        assert_eq!(
            EditorCommand::from_toolbar("fontSizePx", Some(" 18 ")),
            Some(EditorCommand::FontSizePx { size: "18".into() })
        );
        assert_eq!(EditorCommand::from_toolbar("fontSizePx", Some("")), None);
        assert_eq!(
            EditorCommand::from_toolbar("formatBlock", None),
            Some(EditorCommand::FormatBlock { tag: "p".into() })
        );
        assert_eq!(EditorCommand::from_toolbar("justifyFull", None), None);
    }

    #[test]
    fn test_command_serde_shape() {
        let cmd: EditorCommand =
            serde_json::from_str(r#"{"type":"insertImage","url":"https://x/y.png"}"#).unwrap();
        assert_eq!(
            cmd,
            EditorCommand::InsertImage {
                url: Some("https://x/y.png".into())
            }
        );
        let cmd: EditorCommand = serde_json::from_str(r#"{"type":"createLink"}"#).unwrap();
        assert_eq!(cmd, EditorCommand::CreateLink { url: None });
        assert_eq!(
            serde_json::to_string(&EditorCommand::UnorderedList).unwrap(),
            r#"{"type":"insertUnorderedList"}"#
        );
    }
}
