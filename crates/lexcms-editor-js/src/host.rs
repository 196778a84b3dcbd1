//! Browser host: blocking notices through `window.alert` and `window.prompt`.

use lexcms_editor_core::EditorHost;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsHost;

impl EditorHost for JsHost {
    fn alert(&self, message: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(message, "no window for alert");
            return;
        };
        if let Err(e) = window.alert_with_message(message) {
            tracing::warn!(error = ?e, "window.alert failed");
        }
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        let window = web_sys::window()?;
        match window.prompt_with_message_and_default(message, default) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = ?e, "window.prompt failed");
                None
            }
        }
    }
}
