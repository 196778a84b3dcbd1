//! Rich-text edit operations applied to a range inside a surface.
//!
//! These replace the browser's `document.execCommand` family: each [`EditOp`]
//! works directly on the document tree and returns the selection the user
//! should see afterwards.

use indextree::NodeId;
use smol_str::SmolStr;

use crate::config::ClassNames;
use crate::dom::{Document, ElementData};
use crate::error::DomError;
use crate::links::enclosing_anchor;
use crate::range::{
    DomRange, Extracted, Position, TextSelection, common_container, extract, insert_at,
    intersects, split_to,
};
use crate::types::Alignment;

/// Elements that count as a block for alignment, title styling and drops.
pub const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Elements that end an inline run.
const FLOW_TAGS: &[&str] = &[
    "div", "p", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "pre",
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "hr", "section", "article", "figure",
];

/// Targets accepted by `formatBlock`.
pub const FORMAT_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "div",
];

/// Inline tags removed by `removeFormat`, besides non-wrapper spans.
const FORMAT_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "strike", "font", "sub", "sup", "mark", "small", "big",
];

/// Placeholder text that gives a caret somewhere to live inside an empty inline element.
pub const ZERO_WIDTH_SPACE: &str = "\u{200B}";

pub fn is_block(el: &ElementData) -> bool {
    BLOCK_TAGS.contains(&el.tag.as_str())
}

fn is_flow(doc: &Document, node: NodeId) -> bool {
    doc.element(node)
        .is_some_and(|el| FLOW_TAGS.contains(&el.tag.as_str()))
}

/// Nearest block strictly inside `surface` enclosing `node`.
pub fn closest_block(doc: &Document, node: NodeId, surface: NodeId) -> Option<NodeId> {
    doc.closest_within(node, surface, is_block)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
}

impl InlineStyle {
    /// Tag written when applying the style.
    pub fn tag(self) -> &'static str {
        match self {
            InlineStyle::Bold => "b",
            InlineStyle::Italic => "i",
            InlineStyle::Underline => "u",
        }
    }

    /// Whether an element carries this style.
    pub fn matches(self, el: &ElementData) -> bool {
        match self {
            InlineStyle::Bold => el.is("b") || el.is("strong"),
            InlineStyle::Italic => el.is("i") || el.is("em"),
            InlineStyle::Underline => el.is("u"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Template for the element an inline wrap creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineWrap {
    pub tag: SmolStr,
    pub class: Option<String>,
    pub style: Option<(String, String)>,
}

impl InlineWrap {
    pub fn span_with_class(class: &str) -> Self {
        Self {
            tag: SmolStr::new_static("span"),
            class: Some(class.to_string()),
            style: None,
        }
    }

    pub fn span_with_style(prop: &str, value: &str) -> Self {
        Self {
            tag: SmolStr::new_static("span"),
            class: None,
            style: Some((prop.to_string(), value.to_string())),
        }
    }

    fn build(&self, doc: &mut Document) -> NodeId {
        let el = doc.create_element(&self.tag);
        if let Some(class) = &self.class {
            doc.add_class(el, class);
        }
        if let Some((prop, value)) = &self.style {
            doc.set_style(el, prop, value);
        }
        el
    }
}

/// A rich-text edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    /// Bold/italic/underline on or off for the range.
    ToggleInlineStyle(InlineStyle),
    /// Set `text-align` on the blocks in the range, creating one if needed.
    Justify(Alignment),
    /// Replace the range with a node.
    InsertNode(NodeId),
    /// Remove the range's contents.
    DeleteRange,
    /// Link the range (or insert the URL as a link at a caret).
    InsertLink { url: String },
    /// Unwrap every anchor touching the range.
    Unlink,
    /// Turn the current block into a list item, or lift it out of a list.
    ToggleList(ListKind),
    /// Strip inline formatting from the range.
    RemoveFormat,
    /// Wrap the range's inline runs in a new element.
    WrapInline(InlineWrap),
    /// Retag the current block.
    FormatBlock(SmolStr),
}

/// Apply `op` to `range` inside `surface`.
///
/// Returns the new selection, or `None` when the previous selection still
/// applies.
pub fn apply_edit(
    doc: &mut Document,
    classes: &ClassNames,
    surface: NodeId,
    range: DomRange,
    op: &EditOp,
) -> Result<Option<TextSelection>, DomError> {
    if !doc.contains(surface, range.start.node) || !doc.contains(surface, range.end.node) {
        return Err(DomError::OutsideScope);
    }
    let range = lift_out_of_scaffolding(doc, surface, range);
    tracing::trace!(?op, "applying edit");
    match op {
        EditOp::ToggleInlineStyle(style) => toggle_inline(doc, surface, range, *style),
        EditOp::Justify(alignment) => justify(doc, surface, range, *alignment),
        EditOp::InsertNode(node) => {
            let at = if range.is_collapsed() {
                range.start
            } else {
                delete_contents(doc, &range)?
            };
            insert_at(doc, at, *node)?;
            Ok(Position::after(doc, *node).map(TextSelection::caret))
        }
        EditOp::DeleteRange => {
            let at = delete_contents(doc, &range)?;
            Ok(Some(TextSelection::caret(at)))
        }
        EditOp::InsertLink { url } => insert_link(doc, surface, range, url),
        EditOp::Unlink => {
            let anchors: Vec<NodeId> = doc
                .query_all(surface, |el| el.is("a"))
                .into_iter()
                .filter(|&a| intersects(doc, &range, a))
                .collect();
            for anchor in anchors {
                doc.unwrap(anchor)?;
            }
            Ok(None)
        }
        EditOp::ToggleList(kind) => toggle_list(doc, surface, range, *kind),
        EditOp::RemoveFormat => remove_format(doc, classes, surface, range),
        EditOp::WrapInline(template) => wrap_inline(doc, surface, range, template),
        EditOp::FormatBlock(tag) => format_block(doc, surface, range, tag),
    }
}

fn container(doc: &Document, range: &DomRange) -> Result<NodeId, DomError> {
    common_container(doc, range).ok_or(DomError::OutsideScope)
}

fn delete_contents(doc: &mut Document, range: &DomRange) -> Result<Position, DomError> {
    let limit = container(doc, range)?;
    let extracted = extract(doc, range, limit)?;
    Ok(extracted.position(doc))
}

fn reinsert(doc: &mut Document, extracted: &Extracted, nodes: &[NodeId]) -> Result<(), DomError> {
    for &node in nodes {
        doc.insert_before(extracted.parent, node, extracted.before)?;
    }
    Ok(())
}

fn span_selection(doc: &Document, nodes: &[NodeId]) -> Option<TextSelection> {
    let first = Position::before(doc, *nodes.first()?)?;
    let last = Position::after(doc, *nodes.last()?)?;
    Some(TextSelection::new(first, last))
}

fn flow_container(doc: &Document, node: NodeId, surface: NodeId) -> NodeId {
    doc.closest_within(node, surface, |el| FLOW_TAGS.contains(&el.tag.as_str()))
        .unwrap_or(surface)
}

/// Image wrappers and any other `contenteditable="false"` island.
fn is_scaffolding(el: &ElementData) -> bool {
    el.attr("contenteditable")
        .is_some_and(|v| v.eq_ignore_ascii_case("false"))
}

fn scaffolding_at(doc: &Document, surface: NodeId, node: NodeId) -> Option<NodeId> {
    doc.outermost_within(node, surface, is_scaffolding)
}

/// Move endpoints that fall inside scaffolding to just outside it.
fn lift_out_of_scaffolding(doc: &Document, surface: NodeId, range: DomRange) -> DomRange {
    let lift = |pos: Position, after: bool| {
        let Some(island) = scaffolding_at(doc, surface, pos.node) else {
            return pos;
        };
        let moved = if after {
            Position::after(doc, island)
        } else {
            Position::before(doc, island)
        };
        moved.unwrap_or(pos)
    };
    let end = lift(range.end, true);
    let start = if range.is_collapsed() {
        end
    } else {
        lift(range.start, false)
    };
    DomRange::new(start, end)
}

/// Non-empty editable text nodes touched by the range, in document order.
fn texts_in(doc: &Document, surface: NodeId, range: &DomRange) -> Vec<NodeId> {
    doc.descendants(surface)
        .into_iter()
        .filter(|&n| doc.is_text(n) && doc.node_len(n) > 0 && intersects(doc, range, n))
        .filter(|&n| scaffolding_at(doc, surface, n).is_none())
        .collect()
}

/// Split a range into one sub-range per run of text sharing a block container.
///
/// Inline edits work segment by segment so blocks are never split apart.
fn text_segments(doc: &Document, surface: NodeId, range: &DomRange) -> Vec<DomRange> {
    let mut groups: Vec<(NodeId, NodeId, NodeId)> = Vec::new();
    for text in texts_in(doc, surface, range) {
        let block = flow_container(doc, text, surface);
        match groups.last_mut() {
            Some((container, _, last)) if *container == block => *last = text,
            _ => groups.push((block, text, text)),
        }
    }
    groups
        .into_iter()
        .map(|(_, first, last)| {
            let start = if first == range.start.node {
                range.start
            } else {
                Position::new(first, 0)
            };
            let end = if last == range.end.node {
                range.end
            } else {
                Position::end_of(doc, last)
            };
            DomRange::new(start, end)
        })
        .filter(|segment| !segment.is_collapsed())
        .collect()
}

/// Run `f` over each text segment of the range, collecting the nodes it returns.
fn for_each_segment(
    doc: &mut Document,
    surface: NodeId,
    range: &DomRange,
    mut f: impl FnMut(&mut Document, DomRange) -> Result<Vec<NodeId>, DomError>,
) -> Result<Vec<NodeId>, DomError> {
    let mut nodes = Vec::new();
    for segment in text_segments(doc, surface, range) {
        nodes.extend(f(doc, segment)?);
    }
    Ok(nodes)
}

/// Whether every text node the range touches already has the style.
fn range_has_style(
    doc: &Document,
    surface: NodeId,
    range: &DomRange,
    pred: &dyn Fn(&ElementData) -> bool,
) -> bool {
    let texts = texts_in(doc, surface, range);
    if texts.is_empty() {
        return doc.closest_within(range.start.node, surface, pred).is_some();
    }
    texts
        .iter()
        .all(|&t| doc.closest_within(t, surface, pred).is_some())
}

/// Keep the old selection if it survived the edit, else put the caret at the end of `fallback`.
fn keep_or(doc: &Document, range: &DomRange, fallback: NodeId) -> Option<TextSelection> {
    if range.start.is_valid(doc) && range.end.is_valid(doc) {
        None
    } else {
        Some(TextSelection::caret(Position::end_of(doc, fallback)))
    }
}

/// Unwrap every element matching `pred` in a detached subtree.
///
/// Returns the subtree's replacement top-level nodes.
fn unwrap_matching(
    doc: &mut Document,
    node: NodeId,
    pred: &dyn Fn(&ElementData) -> bool,
) -> Result<Vec<NodeId>, DomError> {
    let islands: Vec<NodeId> = doc
        .descendants(node)
        .into_iter()
        .filter(|&d| doc.element(d).is_some_and(is_scaffolding))
        .collect();
    let inner: Vec<NodeId> = doc
        .descendants(node)
        .into_iter()
        .skip(1)
        .filter(|&d| doc.element(d).is_some_and(pred))
        .filter(|&d| !islands.iter().any(|&i| doc.contains(i, d)))
        .collect();
    for d in inner {
        doc.unwrap(d)?;
    }
    if !islands.contains(&node) && doc.element(node).is_some_and(pred) {
        let children = doc.children(node);
        for &child in &children {
            doc.remove(child);
        }
        Ok(children)
    } else {
        Ok(vec![node])
    }
}

fn unwrap_all(
    doc: &mut Document,
    nodes: Vec<NodeId>,
    pred: &dyn Fn(&ElementData) -> bool,
) -> Result<Vec<NodeId>, DomError> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        out.extend(unwrap_matching(doc, node, pred)?);
    }
    Ok(out)
}

/// Wrap each maximal inline run in `nodes` with a fresh element from `make`,
/// descending into block-level nodes.
fn wrap_runs(
    doc: &mut Document,
    nodes: Vec<NodeId>,
    make: &mut dyn FnMut(&mut Document) -> NodeId,
    created: &mut Vec<NodeId>,
) -> Result<Vec<NodeId>, DomError> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for node in nodes {
        if is_flow(doc, node) {
            flush_run(doc, &mut run, make, created, &mut out)?;
            let children = doc.children(node);
            for &child in &children {
                doc.remove(child);
            }
            for wrapped in wrap_runs(doc, children, make, created)? {
                doc.append(node, wrapped)?;
            }
            out.push(node);
        } else {
            run.push(node);
        }
    }
    flush_run(doc, &mut run, make, created, &mut out)?;
    Ok(out)
}

fn flush_run(
    doc: &mut Document,
    run: &mut Vec<NodeId>,
    make: &mut dyn FnMut(&mut Document) -> NodeId,
    created: &mut Vec<NodeId>,
    out: &mut Vec<NodeId>,
) -> Result<(), DomError> {
    if run.is_empty() {
        return Ok(());
    }
    let blank = run
        .iter()
        .all(|&n| doc.text(n).is_some_and(|t| t.trim().is_empty()));
    if blank {
        out.append(run);
        return Ok(());
    }
    let el = make(doc);
    for node in run.drain(..) {
        doc.append(el, node)?;
    }
    created.push(el);
    out.push(el);
    Ok(())
}

/// The inline siblings around `pos` directly under `surface`, up to a block or `<br>`.
fn inline_run(doc: &Document, surface: NodeId, pos: Position) -> Vec<NodeId> {
    let anchor = if pos.node == surface {
        let after = doc.child_at(surface, pos.offset);
        let before = pos
            .offset
            .checked_sub(1)
            .and_then(|i| doc.child_at(surface, i));
        after
            .filter(|&n| !is_flow(doc, n))
            .or(before.filter(|&n| !is_flow(doc, n) && !doc.is_tag(n, "br")))
    } else {
        doc.ancestors(pos.node)
            .into_iter()
            .find(|&a| doc.parent(a) == Some(surface))
    };
    let Some(anchor) = anchor.filter(|&n| !is_flow(doc, n)) else {
        return Vec::new();
    };

    let mut start = anchor;
    while let Some(prev) = doc.previous_sibling(start) {
        if is_flow(doc, prev) || doc.is_tag(prev, "br") {
            break;
        }
        start = prev;
    }
    let mut run = Vec::new();
    let mut cursor = Some(start);
    while let Some(node) = cursor {
        if is_flow(doc, node) {
            break;
        }
        run.push(node);
        if doc.is_tag(node, "br") {
            break;
        }
        cursor = doc.next_sibling(node);
    }
    run
}

/// Where to put a new block when there is no inline run to absorb.
fn block_insertion_point(doc: &Document, surface: NodeId, pos: Position) -> Position {
    if pos.node == surface {
        pos
    } else {
        Position::end_of(doc, surface)
    }
}

/// Move the inline run at `pos` into `block`, or give `block` a `<br>` if there is none.
fn adopt_inline_run(
    doc: &mut Document,
    surface: NodeId,
    pos: Position,
    block: NodeId,
    inner: NodeId,
) -> Result<(), DomError> {
    let run = inline_run(doc, surface, pos);
    match run.first() {
        Some(&first) => {
            doc.insert_before(surface, block, Some(first))?;
            for node in run {
                doc.append(inner, node)?;
            }
        }
        None => {
            let br = doc.create_element("br");
            doc.append(inner, br)?;
            let at = block_insertion_point(doc, surface, pos);
            insert_at(doc, at, block)?;
        }
    }
    Ok(())
}

fn toggle_inline(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    style: InlineStyle,
) -> Result<Option<TextSelection>, DomError> {
    let matches = move |el: &ElementData| style.matches(el);

    if range.is_collapsed() {
        let placeholder = doc.create_text(ZERO_WIDTH_SPACE);
        match doc.outermost_within(range.start.node, surface, matches) {
            Some(formatted) => {
                let limit = doc.parent(formatted).ok_or(DomError::Detached)?;
                let idx = split_to(doc, range.start, limit)?;
                let reference = doc.child_at(limit, idx);
                doc.insert_before(limit, placeholder, reference)?;
            }
            None => {
                let el = doc.create_element(style.tag());
                doc.append(el, placeholder)?;
                insert_at(doc, range.start, el)?;
            }
        }
        return Ok(Some(TextSelection::caret(Position::new(placeholder, 1))));
    }

    let active = range_has_style(doc, surface, &range, &matches);
    let nodes = for_each_segment(doc, surface, &range, |doc, segment| {
        let common = container(doc, &segment)?;
        let limit = match doc.outermost_within(common, surface, matches) {
            Some(formatted) => doc.parent(formatted).ok_or(DomError::Detached)?,
            None => common,
        };
        let extracted = extract(doc, &segment, limit)?;
        let stripped = unwrap_all(doc, extracted.nodes.clone(), &matches)?;
        let nodes = if active {
            stripped
        } else {
            let mut created = Vec::new();
            wrap_runs(
                doc,
                stripped,
                &mut |d: &mut Document| d.create_element(style.tag()),
                &mut created,
            )?
        };
        reinsert(doc, &extracted, &nodes)?;
        Ok(nodes)
    })?;
    Ok(span_selection(doc, &nodes))
}

/// The innermost blocks inside `surface` that the range touches.
fn target_blocks(doc: &Document, surface: NodeId, range: &DomRange) -> Vec<NodeId> {
    let hits: Vec<NodeId> = doc
        .query_all(surface, is_block)
        .into_iter()
        .filter(|&b| intersects(doc, range, b))
        .collect();
    hits.iter()
        .copied()
        .filter(|&b| !hits.iter().any(|&h| h != b && doc.contains(b, h)))
        .collect()
}

fn justify(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    alignment: Alignment,
) -> Result<Option<TextSelection>, DomError> {
    let blocks = target_blocks(doc, surface, &range);
    if !blocks.is_empty() {
        for block in blocks {
            doc.set_style(block, "text-align", alignment.css_value());
        }
        return Ok(None);
    }
    let div = doc.create_element("div");
    doc.set_style(div, "text-align", alignment.css_value());
    adopt_inline_run(doc, surface, range.start, div, div)?;
    if range.start.node == surface || range.end.node == surface {
        return Ok(Some(TextSelection::caret(Position::end_of(doc, div))));
    }
    Ok(keep_or(doc, &range, div))
}

fn insert_link(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    url: &str,
) -> Result<Option<TextSelection>, DomError> {
    let start_anchor = enclosing_anchor(doc, range.start.node, surface);
    if range.is_collapsed() {
        if let Some(anchor) = start_anchor {
            doc.set_attr(anchor, "href", url);
            return Ok(None);
        }
        let anchor = doc.create_element("a");
        doc.set_attr(anchor, "href", url);
        let label = doc.create_text(url);
        doc.append(anchor, label)?;
        insert_at(doc, range.start, anchor)?;
        return Ok(Position::after(doc, anchor).map(TextSelection::caret));
    }
    if start_anchor.is_some() && start_anchor == enclosing_anchor(doc, range.end.node, surface) {
        if let Some(anchor) = start_anchor {
            doc.set_attr(anchor, "href", url);
        }
        return Ok(None);
    }

    let nodes = for_each_segment(doc, surface, &range, |doc, segment| {
        let limit = container(doc, &segment)?;
        let extracted = extract(doc, &segment, limit)?;
        let stripped = unwrap_all(doc, extracted.nodes.clone(), &|el: &ElementData| el.is("a"))?;
        let mut created = Vec::new();
        let nodes = wrap_runs(
            doc,
            stripped,
            &mut |d: &mut Document| {
                let anchor = d.create_element("a");
                d.set_attr(anchor, "href", url);
                anchor
            },
            &mut created,
        )?;
        reinsert(doc, &extracted, &nodes)?;
        Ok(nodes)
    })?;
    Ok(span_selection(doc, &nodes))
}

fn toggle_list(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    kind: ListKind,
) -> Result<Option<TextSelection>, DomError> {
    let tag = kind.tag();
    let item = doc.closest_within(range.start.node, surface, |el| el.is("li"));
    let list = item.and_then(|li| doc.parent(li)).filter(|&l| {
        doc.is_tag(l, "ul") || doc.is_tag(l, "ol")
    });

    if let Some(list) = list {
        if !doc.is_tag(list, tag) {
            doc.rename(list, tag)?;
            return Ok(None);
        }
        // Lift every item out of the list as a plain line.
        let parent = doc.parent(list).ok_or(DomError::Detached)?;
        let mut first = None;
        for child in doc.children(list) {
            let lifted = if doc.is_tag(child, "li") {
                let line = doc.create_element("div");
                for grandchild in doc.children(child) {
                    doc.append(line, grandchild)?;
                }
                if doc.first_child(line).is_none() {
                    let br = doc.create_element("br");
                    doc.append(line, br)?;
                }
                line
            } else {
                child
            };
            doc.insert_before(parent, lifted, Some(list))?;
            first.get_or_insert(lifted);
        }
        doc.remove(list);
        return Ok(first.and_then(|f| keep_or(doc, &range, f)));
    }

    let list = doc.create_element(tag);
    let item = doc.create_element("li");
    doc.append(list, item)?;
    match closest_block(doc, range.start.node, surface) {
        Some(block) if !doc.is_tag(block, "li") => {
            let parent = doc.parent(block).ok_or(DomError::Detached)?;
            doc.insert_before(parent, list, Some(block))?;
            for child in doc.children(block) {
                doc.append(item, child)?;
            }
            doc.remove(block);
            if doc.first_child(item).is_none() {
                let br = doc.create_element("br");
                doc.append(item, br)?;
            }
        }
        _ => adopt_inline_run(doc, surface, range.start, list, item)?,
    }
    Ok(keep_or(doc, &range, item))
}

fn is_formatting(el: &ElementData, classes: &ClassNames) -> bool {
    FORMAT_TAGS.contains(&el.tag.as_str()) || (el.is("span") && !el.has_class(&classes.wrapper))
}

fn remove_format(
    doc: &mut Document,
    classes: &ClassNames,
    surface: NodeId,
    range: DomRange,
) -> Result<Option<TextSelection>, DomError> {
    if range.is_collapsed() {
        return Ok(None);
    }
    let is_format = |el: &ElementData| is_formatting(el, classes);
    let nodes = for_each_segment(doc, surface, &range, |doc, segment| {
        let common = container(doc, &segment)?;
        let limit = doc
            .outermost_within(common, surface, is_format)
            .and_then(|f| doc.parent(f))
            .unwrap_or(common);
        let extracted = extract(doc, &segment, limit)?;
        let nodes = unwrap_all(doc, extracted.nodes.clone(), &is_format)?;
        reinsert(doc, &extracted, &nodes)?;
        Ok(nodes)
    })?;
    Ok(span_selection(doc, &nodes))
}

fn wrap_inline(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    template: &InlineWrap,
) -> Result<Option<TextSelection>, DomError> {
    if range.is_collapsed() {
        let el = template.build(doc);
        let placeholder = doc.create_text(ZERO_WIDTH_SPACE);
        doc.append(el, placeholder)?;
        insert_at(doc, range.start, el)?;
        return Ok(Some(TextSelection::caret(Position::new(placeholder, 1))));
    }
    let mut created = Vec::new();
    for_each_segment(doc, surface, &range, |doc, segment| {
        let limit = container(doc, &segment)?;
        let extracted = extract(doc, &segment, limit)?;
        let nodes = wrap_runs(
            doc,
            extracted.nodes.clone(),
            &mut |d: &mut Document| template.build(d),
            &mut created,
        )?;
        reinsert(doc, &extracted, &nodes)?;
        Ok(nodes)
    })?;
    Ok(created
        .last()
        .map(|&el| TextSelection::caret(Position::end_of(doc, el))))
}

fn format_block(
    doc: &mut Document,
    surface: NodeId,
    range: DomRange,
    tag: &str,
) -> Result<Option<TextSelection>, DomError> {
    match closest_block(doc, range.start.node, surface) {
        Some(item) if doc.is_tag(item, "li") => {
            let block = doc.create_element(tag);
            for child in doc.children(item) {
                doc.append(block, child)?;
            }
            doc.append(item, block)?;
            Ok(None)
        }
        Some(block) => {
            doc.rename(block, tag)?;
            Ok(None)
        }
        None => {
            let block = doc.create_element(tag);
            adopt_inline_run(doc, surface, range.start, block, block)?;
            Ok(keep_or(doc, &range, block))
        }
    }
}
