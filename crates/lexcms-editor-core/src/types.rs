//! Shared editor types: surface identity, image placement classes and sizes.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of a bound editor surface (the surface element's `id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(SmolStr);

impl SurfaceId {
    pub fn new(id: &str) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SurfaceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal image placement. Persisted as an `img-align-*` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn class(self) -> &'static str {
        match self {
            Alignment::Left => "img-align-left",
            Alignment::Center => "img-align-center",
            Alignment::Right => "img-align-right",
        }
    }

    /// Value of the CSS `text-align` property for this alignment.
    pub fn css_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    /// Parse a `text-align` value. `start`/`end` are treated as left/right.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Text flow around an image. Persisted as an `img-wrap-*` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Text flows around the image (floated).
    Square,
    /// The image sits on its own line.
    Block,
}

impl WrapMode {
    pub fn class(self) -> &'static str {
        match self {
            WrapMode::Square => "img-wrap-square",
            WrapMode::Block => "img-wrap-block",
        }
    }
}

/// The five alignment/wrap classes that travel between an image and its wrapper.
pub const IMAGE_STATE_CLASSES: [&str; 5] = [
    "img-wrap-square",
    "img-wrap-block",
    "img-align-left",
    "img-align-center",
    "img-align-right",
];

/// Rendered size of a wrapper, as reported by the platform after a resize gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WrapperRect {
    pub width: f64,
    pub height: f64,
}

impl WrapperRect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Format a pixel length the way the editor writes it into inline styles.
pub fn format_px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}px")
}
