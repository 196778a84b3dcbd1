//! Arena-backed document tree.
//!
//! The editor operates on an in-memory mirror of the admin page: a single
//! [`Document`] holding every surface, toolbar and the nodes inside them.
//! Nodes are addressed by [`NodeId`]. Detached nodes stay in the arena until
//! the document is dropped, so an id held across a mutation never points at a
//! different node; use [`Document::is_connected`] to test reachability.

use indextree::{Arena, NodeId};
use smol_str::SmolStr;

use crate::error::DomError;

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// An element's tag and attributes.
///
/// Tags are stored lowercase. Attribute order is preserved for serialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    pub tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self
                .attrs
                .push((SmolStr::new(name.to_ascii_lowercase()), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self
            .attrs
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    // === class list ===

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut list: Vec<&str> = self.classes().collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", joined);
        }
    }

    // === inline style ===

    /// Parsed `style` declarations in source order, property names lowercased.
    pub fn style_declarations(&self) -> Vec<(String, String)> {
        self.attr("style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim().to_ascii_lowercase();
                let value = value.trim();
                if prop.is_empty() || value.is_empty() {
                    return None;
                }
                Some((prop, value.to_string()))
            })
            .collect()
    }

    /// Value of one inline style property, if set and non-empty.
    pub fn style(&self, prop: &str) -> Option<String> {
        self.style_declarations()
            .into_iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(prop))
            .map(|(_, v)| v)
    }

    pub fn set_style(&mut self, prop: &str, value: &str) {
        let prop = prop.to_ascii_lowercase();
        let mut decls = self.style_declarations();
        match decls.iter_mut().find(|(p, _)| *p == prop) {
            Some((_, v)) => *v = value.to_string(),
            None => decls.push((prop, value.to_string())),
        }
        self.write_style(decls);
    }

    pub fn remove_style(&mut self, prop: &str) {
        let mut decls = self.style_declarations();
        let before = decls.len();
        decls.retain(|(p, _)| !p.eq_ignore_ascii_case(prop));
        if decls.len() != before {
            self.write_style(decls);
        }
    }

    fn write_style(&mut self, decls: Vec<(String, String)>) {
        if decls.is_empty() {
            self.remove_attr("style");
            return;
        }
        let text = decls
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("style", text);
    }

    // === data-* ===

    /// Read a `data-*` attribute by its suffix (`data("img-width")`).
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attr(&format!("data-{key}"))
    }

    pub fn set_data(&mut self, key: &str, value: impl Into<String>) {
        self.set_attr(&format!("data-{key}"), value);
    }
}

/// The document tree.
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Document);
        Self { arena, root }
    }

    /// Build a document from an HTML fragment.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        crate::html::parse_into(&mut doc, root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // === creation ===

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData::Comment(text.into()))
    }

    // === node data ===

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.arena.get(id).map(|n| n.get())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.arena.get_mut(id)?.get_mut() {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    /// Character data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        match self.arena.get_mut(id).map(|n| n.get_mut()) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => {
                *t = value.into();
                Ok(())
            }
            _ => Err(DomError::NotText),
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|el| el.is(tag))
    }

    /// Change an element's tag in place, keeping attributes and children.
    pub fn rename(&mut self, id: NodeId, tag: &str) -> Result<(), DomError> {
        let el = self.element_mut(id).ok_or(DomError::NotAContainer)?;
        el.tag = SmolStr::new(tag.to_ascii_lowercase());
        Ok(())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Set an attribute. No-op on non-elements.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.remove_attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.add_class(class);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_class(class);
        }
    }

    pub fn style(&self, id: NodeId, prop: &str) -> Option<String> {
        self.element(id)?.style(prop)
    }

    pub fn set_style(&mut self, id: NodeId, prop: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_style(prop, value);
        }
    }

    pub fn remove_style(&mut self, id: NodeId, prop: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_style(prop);
        }
    }

    // === navigation ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.first_child()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.last_child()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.next_sibling()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.previous_sibling()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if self.arena.get(id).is_none() {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        if self.arena.get(id).is_none() {
            return 0;
        }
        id.children(&self.arena).count()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        if self.arena.get(id).is_none() {
            return None;
        }
        id.children(&self.arena).nth(index)
    }

    /// Position of a node among its parent's children.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        parent.children(&self.arena).position(|c| c == id)
    }

    /// The node followed by its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        if self.arena.get(id).is_none() {
            return Vec::new();
        }
        id.ancestors(&self.arena).collect()
    }

    /// The node followed by its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        if self.arena.get(id).is_none() {
            return Vec::new();
        }
        id.descendants(&self.arena).collect()
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.arena.get(node).is_none() {
            return false;
        }
        node.ancestors(&self.arena).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Nearest inclusive ancestor element matching `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        self.ancestors(id)
            .into_iter()
            .find(|&a| self.element(a).is_some_and(&pred))
    }

    /// Like [`closest`](Self::closest), but stops before leaving `scope`.
    /// The scope itself is never returned.
    pub fn closest_within(
        &self,
        id: NodeId,
        scope: NodeId,
        pred: impl Fn(&ElementData) -> bool,
    ) -> Option<NodeId> {
        for a in self.ancestors(id) {
            if a == scope {
                return None;
            }
            if self.element(a).is_some_and(&pred) {
                return Some(a);
            }
        }
        None
    }

    /// Outermost ancestor element matching `pred` strictly inside `scope`.
    pub fn outermost_within(
        &self,
        id: NodeId,
        scope: NodeId,
        pred: impl Fn(&ElementData) -> bool,
    ) -> Option<NodeId> {
        let mut found = None;
        for a in self.ancestors(id) {
            if a == scope {
                return found;
            }
            if self.element(a).is_some_and(&pred) {
                found = Some(a);
            }
        }
        None
    }

    /// Descendant elements of `scope` (excluding `scope`) matching `pred`, in document order.
    pub fn query_all(&self, scope: NodeId, pred: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .filter(|&d| self.element(d).is_some_and(&pred))
            .collect()
    }

    pub fn query(&self, scope: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .find(|&d| self.element(d).is_some_and(&pred))
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.root, |el| el.attr("id") == Some(id))
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.query(self.root, |el| el.is("body"))
    }

    // === mutation ===

    fn check_insert(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        match self.data(parent) {
            Some(NodeData::Element(_)) | Some(NodeData::Document) => {}
            _ => return Err(DomError::NotAContainer),
        }
        if self.arena.get(node).is_none() {
            return Err(DomError::Detached);
        }
        if self.contains(node, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Append `node` as the last child of `parent`, moving it if attached elsewhere.
    pub fn append(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, node)?;
        node.detach(&mut self.arena);
        parent.checked_append(node, &mut self.arena)?;
        Ok(())
    }

    /// Insert `node` into `parent` before `reference`, or at the end when `reference` is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insert(parent, node)?;
        let reference = match reference {
            Some(r) if r == node => self.next_sibling(node),
            other => other,
        };
        match reference {
            Some(r) => {
                if self.parent(r) != Some(parent) {
                    return Err(DomError::NotAChild);
                }
                node.detach(&mut self.arena);
                r.checked_insert_before(node, &mut self.arena)?;
                Ok(())
            }
            None => self.append(parent, node),
        }
    }

    /// Insert `node` right after `reference` in its parent.
    pub fn insert_after(&mut self, node: NodeId, reference: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached)?;
        if node == reference {
            return Ok(());
        }
        let next = self.next_sibling(reference);
        self.insert_before(parent, node, next)
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) {
        if self.arena.get(id).is_some() {
            id.detach(&mut self.arena);
        }
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        if old == new {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(DomError::Detached)?;
        self.insert_before(parent, new, Some(old))?;
        self.remove(old);
        Ok(())
    }

    /// Replace an element with its children.
    pub fn unwrap(&mut self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached)?;
        let children = self.children(id);
        for &child in &children {
            self.insert_before(parent, child, Some(id))?;
        }
        self.remove(id);
        Ok(children)
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    /// Copy a node without its children. Element `id` attributes are not copied.
    pub fn shallow_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let mut data = self.data(id)?.clone();
        if let NodeData::Element(el) = &mut data {
            el.remove_attr("id");
        }
        Some(self.arena.new_node(data))
    }

    /// Copy the children of `from` in `src` and append them to `into`.
    pub fn import_children(&mut self, src: &Document, from: NodeId, into: NodeId) {
        for child in src.children(from) {
            if let Some(copy) = self.import_node(src, child) {
                into.append(copy, &mut self.arena);
            }
        }
    }

    fn import_node(&mut self, src: &Document, id: NodeId) -> Option<NodeId> {
        let copy = self.arena.new_node(src.data(id)?.clone());
        for child in src.children(id) {
            if let Some(c) = self.import_node(src, child) {
                copy.append(c, &mut self.arena);
            }
        }
        Some(copy)
    }

    // === text and markup ===

    /// Boundary length: characters for character data, children otherwise.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => t.chars().count(),
            Some(_) => self.child_count(id),
            None => 0,
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for d in self.descendants(id) {
            if let Some(NodeData::Text(t)) = self.data(d) {
                out.push_str(t);
            }
        }
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        crate::html::serialize_children(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        crate::html::serialize_node(self, id)
    }

    /// Replace the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        match self.data(id) {
            Some(NodeData::Element(_)) | Some(NodeData::Document) => {}
            _ => return Err(DomError::NotAContainer),
        }
        self.clear_children(id);
        crate::html::parse_into(self, id, html);
        Ok(())
    }
}
