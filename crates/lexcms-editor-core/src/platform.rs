//! Host integration: the blocking notices the editor needs from its page.
//!
//! The browser facade implements [`EditorHost`] with `window.alert` and
//! `window.prompt`; native callers and tests use `()` or a recording host.

/// Blocking user interaction provided by the embedding page.
pub trait EditorHost {
    /// Show a blocking notice.
    fn alert(&self, message: &str);

    /// Ask for a line of text. `None` means the user cancelled.
    fn prompt(&self, message: &str, default: &str) -> Option<String>;
}

/// Headless host: notices are logged, prompts are declined.
impl EditorHost for () {
    fn alert(&self, message: &str) {
        tracing::info!(message, "editor notice");
    }

    fn prompt(&self, message: &str, _default: &str) -> Option<String> {
        tracing::debug!(message, "prompt declined by headless host");
        None
    }
}

impl<T: EditorHost> EditorHost for &T {
    fn alert(&self, message: &str) {
        (*self).alert(message)
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        (*self).prompt(message, default)
    }
}

impl<T: EditorHost> EditorHost for Option<T> {
    fn alert(&self, message: &str) {
        if let Some(host) = self {
            host.alert(message)
        }
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        self.as_ref()?.prompt(message, default)
    }
}
