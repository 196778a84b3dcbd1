//! Escaping and URL checks for user-supplied strings.

use std::fmt;

use markdown_weaver_escape::{FmtWriter, escape_html};

/// Escape `& < > " '` so the string is safe inside markup and quoted attributes.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    // Writing into a String cannot fail.
    write_escaped(&mut out, input).ok();
    out
}

fn write_escaped(out: &mut String, input: &str) -> fmt::Result {
    for (i, part) in input.split('\'').enumerate() {
        if i > 0 {
            out.push_str("&#39;");
        }
        escape_html(FmtWriter(&mut *out), part)?;
    }
    Ok(())
}

/// Whether `url` (after trimming) starts with `http://` or `https://`, case-insensitively.
pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    has_prefix_ci(url, "http://") || has_prefix_ci(url, "https://")
}

/// Whether `url` is acceptable as a link target.
///
/// Rejects script-bearing schemes (`javascript:`, `vbscript:`, `data:`),
/// ignoring case and the ASCII whitespace/control characters browsers strip
/// before resolving a scheme. Relative links, anchors and `mailto:` pass.
pub fn is_safe_link_url(url: &str) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(16)
        .collect();
    !["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| has_prefix_ci(&compact, scheme))
}

fn has_prefix_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
