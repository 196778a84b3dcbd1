//! HTML fragment parsing and serialization for the document tree.
//!
//! The parser is tolerant in the way a browser's `innerHTML` setter is for the
//! markup a contenteditable surface produces: unknown end tags are ignored,
//! unclosed elements are closed at the end of the fragment, `<p>` closes on a
//! following block start, and `<li>` closes a previous open item in the same
//! list. The serializer follows `innerHTML` output conventions.

use std::borrow::Cow;
use std::fmt;

use indextree::NodeId;
use markdown_weaver_escape::{FmtWriter, StrWrite, escape_html, escape_html_body_text};

use crate::dom::{Document, NodeData};

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Start tags that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse `html` and append the resulting nodes to `parent`.
pub(crate) fn parse_into(doc: &mut Document, parent: NodeId, html: &str) {
    let mut builder = TreeBuilder {
        doc,
        stack: vec![parent],
        text: String::new(),
    };
    let bytes = html.as_bytes();
    let mut pos = 0;

    while pos < html.len() {
        if bytes[pos] != b'<' {
            let end = html[pos..].find('<').map_or(html.len(), |i| pos + i);
            builder.text.push_str(&decode_entities(&html[pos..end]));
            pos = end;
            continue;
        }

        let rest = &html[pos..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(i) => (&body[..i], 4 + i + 3),
                None => (body, rest.len()),
            };
            builder.comment(comment);
            pos += consumed;
        } else if rest.starts_with("</") {
            let after = &rest[2..];
            let name_len = after
                .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                .unwrap_or(after.len());
            let name = after[..name_len].to_ascii_lowercase();
            let consumed = rest.find('>').map_or(rest.len(), |i| i + 1);
            if !name.is_empty() {
                builder.end_tag(&name);
            }
            pos += consumed;
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            // doctype or bogus comment
            pos += rest.find('>').map_or(rest.len(), |i| i + 1);
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            match parse_start_tag(rest) {
                Some(tag) => {
                    pos += tag.consumed;
                    let raw = RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
                    let el = builder.start_tag(&tag);
                    if raw {
                        let content = &html[pos..];
                        let close = format!("</{}", tag.name);
                        let end = find_ascii_ci(content, &close).unwrap_or(content.len());
                        if end > 0 {
                            let text = builder.doc.create_text(&content[..end]);
                            builder.attach(el, text);
                        }
                        builder.pop_to(el);
                        pos += end;
                        let tail = &html[pos..];
                        pos += tail.find('>').map_or(tail.len(), |i| i + 1);
                    }
                }
                // unterminated tag at end of input is dropped
                None => pos = html.len(),
            }
        } else {
            builder.text.push('<');
            pos += 1;
        }
    }
    builder.flush_text();
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    stack: Vec<NodeId>,
    text: String,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        // stack always holds the fragment parent
        self.stack[self.stack.len() - 1]
    }

    fn attach(&mut self, parent: NodeId, node: NodeId) {
        if let Err(e) = self.doc.append(parent, node) {
            tracing::warn!(error = %e, "dropping node while parsing markup");
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let parent = self.current();
        let node = self.doc.create_text(text);
        self.attach(parent, node);
    }

    fn comment(&mut self, text: &str) {
        self.flush_text();
        let parent = self.current();
        let node = self.doc.create_comment(text);
        self.attach(parent, node);
    }

    fn start_tag(&mut self, tag: &StartTag) -> NodeId {
        self.flush_text();
        let name = tag.name.as_str();
        if CLOSES_PARAGRAPH.contains(&name) {
            self.close_open("p", &[]);
        }
        if name == "li" {
            self.close_open("li", &["ul", "ol"]);
        }

        let el = self.doc.create_element(name);
        if let Some(data) = self.doc.element_mut(el) {
            for (attr, value) in &tag.attrs {
                if !data.has_attr(attr) {
                    data.set_attr(attr, value.clone());
                }
            }
        }
        let parent = self.current();
        self.attach(parent, el);
        if !is_void(name) {
            self.stack.push(el);
        }
        el
    }

    fn end_tag(&mut self, name: &str) {
        self.flush_text();
        if let Some(idx) = self.open_index(name, &[]) {
            self.stack.truncate(idx);
        }
    }

    /// Close the innermost open `tag` unless one of `scope` is reached first.
    fn close_open(&mut self, tag: &str, scope: &[&str]) {
        if let Some(idx) = self.open_index(tag, scope) {
            self.stack.truncate(idx);
        }
    }

    fn open_index(&self, tag: &str, scope: &[&str]) -> Option<usize> {
        for idx in (1..self.stack.len()).rev() {
            let open = self.stack[idx];
            if self.doc.is_tag(open, tag) {
                return Some(idx);
            }
            if scope.iter().any(|s| self.doc.is_tag(open, s)) {
                return None;
            }
        }
        None
    }

    fn pop_to(&mut self, el: NodeId) {
        if let Some(idx) = self.stack.iter().rposition(|&n| n == el) {
            self.stack.truncate(idx);
        }
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    consumed: usize,
}

/// Parse a start tag at the beginning of `input` (which starts with `<`).
fn parse_start_tag(input: &str) -> Option<StartTag> {
    let bytes = input.as_bytes();
    let mut pos = 1;
    let name_end = input[pos..]
        .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
        .map_or(input.len(), |i| pos + i);
    let name = input[pos..name_end].to_ascii_lowercase();
    pos = name_end;
    let mut attrs = Vec::new();

    loop {
        while pos < input.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            if bytes[pos] == b'/' && bytes.get(pos + 1) == Some(&b'>') {
                return Some(StartTag {
                    name,
                    attrs,
                    consumed: pos + 2,
                });
            }
            pos += 1;
        }
        if pos >= input.len() {
            return None;
        }
        if bytes[pos] == b'>' {
            return Some(StartTag {
                name,
                attrs,
                consumed: pos + 1,
            });
        }

        let attr_end = input[pos..]
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '>' | '/' | '='))
            .map_or(input.len(), |i| pos + i);
        // `=` at the start of a name is kept as part of the name
        let attr_end = if attr_end == pos { pos + 1 } else { attr_end };
        let attr_name = input[pos..attr_end].to_ascii_lowercase();
        pos = attr_end;

        while pos < input.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if pos < input.len() && bytes[pos] == b'=' {
            pos += 1;
            while pos < input.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let close = input[pos + 1..].find(q as char)?;
                    value = decode_entities(&input[pos + 1..pos + 1 + close]).into_owned();
                    pos += close + 2;
                }
                Some(_) => {
                    let end = input[pos..]
                        .find(|c: char| c.is_ascii_whitespace() || c == '>')
                        .map_or(input.len(), |i| pos + i);
                    value = decode_entities(&input[pos..end]).into_owned();
                    pos = end;
                }
                None => return None,
            }
        }
        attrs.push((attr_name, value));
    }
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Decode the character references the editor's markup uses.
///
/// Named references outside the small set below are left as written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|&semi| semi <= 32)
            .and_then(|semi| decode_reference(&rest[1..1 + semi]).map(|c| (c, semi + 2)));
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|&c| c != '\0');
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "times" => Some('×'),
        "copy" => Some('©'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "hellip" => Some('…'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        "rsquo" => Some('\u{2019}'),
        "lsquo" => Some('\u{2018}'),
        "rdquo" => Some('\u{201d}'),
        "ldquo" => Some('\u{201c}'),
        _ => None,
    }
}

// === serialization ===

pub(crate) fn serialize_children(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = doc
        .tag(id)
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
    for child in doc.children(id) {
        if let Err(e) = write_node(doc, child, raw, &mut FmtWriter(&mut out)) {
            tracing::error!(error = ?e, "serializing markup into a string failed");
        }
    }
    out
}

pub(crate) fn serialize_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = doc
        .parent(id)
        .and_then(|p| doc.tag(p))
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
    if let Err(e) = write_node(doc, id, raw, &mut FmtWriter(&mut out)) {
        tracing::error!(error = ?e, "serializing markup into a string failed");
    }
    out
}

fn write_node<W: StrWrite>(
    doc: &Document,
    id: NodeId,
    raw_text: bool,
    w: &mut W,
) -> Result<(), W::Error> {
    match doc.data(id) {
        Some(NodeData::Text(text)) if raw_text => w.write_str(text),
        Some(NodeData::Text(text)) => write_escaped(w, text, false),
        Some(NodeData::Comment(text)) => {
            w.write_str("<!--")?;
            w.write_str(text)?;
            w.write_str("-->")
        }
        Some(NodeData::Element(el)) => {
            w.write_str("<")?;
            w.write_str(&el.tag)?;
            for (name, value) in el.attrs() {
                w.write_str(" ")?;
                w.write_str(name)?;
                w.write_str("=\"")?;
                write_escaped(w, value, true)?;
                w.write_str("\"")?;
            }
            w.write_str(">")?;
            if is_void(&el.tag) {
                return Ok(());
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&el.tag.as_str());
            for child in doc.children(id) {
                write_node(doc, child, raw, w)?;
            }
            w.write_str("</")?;
            w.write_str(&el.tag)?;
            w.write_str(">")
        }
        Some(NodeData::Document) => {
            for child in doc.children(id) {
                write_node(doc, child, false, w)?;
            }
            Ok(())
        }
        None => Ok(()),
    }
}

/// Escape body text or an attribute value, writing no-break spaces as `&nbsp;`.
fn write_escaped<W: StrWrite>(w: &mut W, text: &str, attribute: bool) -> Result<(), W::Error> {
    for (i, part) in text.split('\u{a0}').enumerate() {
        if i > 0 {
            w.write_str("&nbsp;")?;
        }
        if attribute {
            escape_html(&mut *w, part)?;
        } else {
            escape_html_body_text(&mut *w, part)?;
        }
    }
    Ok(())
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_children(self, self.root()))
    }
}
