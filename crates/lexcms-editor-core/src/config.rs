//! Editor configuration: class names, limits and user-facing texts.

use serde::{Deserialize, Serialize};

/// Configuration for an [`EditorSession`](crate::EditorSession).
///
/// Every field has a default matching the admin console's stylesheet and copy,
/// so a partial configuration object deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub classes: ClassNames,
    pub font_size: FontSizeBounds,
    /// Rendered heights at or below this are not written back after a resize.
    pub min_tracked_height_px: f64,
    /// Undo snapshots kept per surface.
    pub history_depth: usize,
    pub messages: Messages,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            classes: ClassNames::default(),
            font_size: FontSizeBounds::default(),
            min_tracked_height_px: 4.0,
            history_depth: 100,
            messages: Messages::default(),
        }
    }
}

/// CSS class names the editor reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassNames {
    pub surface: String,
    pub wrapper: String,
    pub delete_button: String,
    pub selected: String,
    pub drag_over: String,
    pub title: String,
    pub subtitle: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            surface: "editor-surface".into(),
            wrapper: "img-resizable".into(),
            delete_button: "img-delete".into(),
            selected: "img-selected".into(),
            drag_over: "drag-over".into(),
            title: "text-title".into(),
            subtitle: "text-subtitle".into(),
        }
    }
}

/// Inclusive bounds for `fontSizePx`, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizeBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for FontSizeBounds {
    fn default() -> Self {
        Self { min: 8, max: 96 }
    }
}

impl FontSizeBounds {
    pub fn contains(&self, px: u32) -> bool {
        (self.min..=self.max).contains(&px)
    }

    /// Parse a user-entered size: an integer with an optional `px` suffix.
    pub fn parse(&self, raw: &str) -> Option<u32> {
        let raw = raw.trim();
        let digits = raw
            .strip_suffix("px")
            .or_else(|| raw.strip_suffix("PX"))
            .unwrap_or(raw)
            .trim_end();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|&px| self.contains(px))
    }
}

/// Texts shown through the host's blocking notices and prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
    pub select_image_first: String,
    pub invalid_image_url: String,
    pub invalid_link_url: String,
    pub invalid_font_size: String,
    pub link_prompt: String,
    pub image_prompt: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            select_image_first: "Click an image in the editor first.".into(),
            invalid_image_url: "Please enter a valid http(s) image URL.".into(),
            invalid_link_url: "That link address is not allowed.".into(),
            invalid_font_size: "Font size must be a whole number between 8 and 96.".into(),
            link_prompt: "Link URL".into(),
            image_prompt: "Image URL (http/https)".into(),
        }
    }
}
