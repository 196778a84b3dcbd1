//! WASM bindings for the lexcms admin rich-text editor.
//!
//! The page keeps its own DOM; [`JsEditorSession`] mirrors each bound
//! toolbar/editor pair into a core [`EditorSession`](lexcms_editor_core::EditorSession),
//! forwards events to it and writes the resulting markup back.

mod host;
mod mirror;
mod session;
mod types;

pub use host::*;
pub use session::*;
pub use types::*;

use tracing::Level;
use wasm_bindgen::prelude::*;

/// Install the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(level)
            .build(),
    );
}
