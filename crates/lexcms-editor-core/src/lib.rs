//! lexcms-editor-core: the admin console's rich-text editor, without a browser.
//!
//! This crate provides:
//! - `Document` - an arena HTML tree standing in for the live DOM
//! - Image wrappers, per-surface image selection and drag-to-reposition
//! - `EditorCommand` dispatch with range-based edits instead of `execCommand`
//! - Serialization to and from wrapper-free persisted markup
//!
//! The wasm facade in `lexcms-editor-js` mirrors page events into an
//! [`EditorSession`] and applies the results to the real page.

pub mod commands;
pub mod config;
pub mod dom;
pub mod drag;
pub mod edit;
pub mod error;
pub mod events;
pub mod history;
pub mod html;
pub mod links;
pub mod platform;
pub mod range;
pub mod sanitize;
pub mod selection;
pub mod serialize;
pub mod session;
pub mod types;
pub mod wrapper;

#[cfg(test)]
mod tests;

pub use commands::{CommandOutcome, EditorCommand, Notice};
pub use config::{ClassNames, EditorConfig, FontSizeBounds, Messages};
pub use dom::{Document, ElementData, NodeData};
pub use drag::{DragEngine, DragSession, DragStart, DropOutcome, DropResult, RollbackReason};
pub use edit::{EditOp, InlineStyle, InlineWrap, ListKind, apply_edit};
pub use error::{DomError, EditorError};
pub use events::{ClickResult, Key, KeydownResult};
pub use history::SnapshotHistory;
pub use indextree::NodeId;
pub use links::ensure_link_targets;
pub use platform::EditorHost;
pub use range::{DomRange, Position, TextSelection};
pub use sanitize::{escape_text, is_http_url, is_safe_link_url};
pub use selection::SelectionTracker;
pub use serialize::serialize_surface;
pub use session::{EditorSession, SetupOutcome, Surface};
pub use smol_str::SmolStr;
pub use types::{Alignment, SurfaceId, WrapMode, WrapperRect};
pub use wrapper::{ensure_resizable_images, ensure_wrapped, sync_size};
