//! Arena document model
//!
//! Nodes live in a single `Vec` owned by the [`Document`] and are addressed by [`NodeId`].
//! A parent owns the ordered list of its children; detaching a node only unlinks it, the
//! slot stays valid so ids held by callers never dangle.

use crate::error::{MarkupError, Result};

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Stable handle to a node inside one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element attribute, namespace declarations included (`xmlns`, `xmlns:p`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }

    /// Prefix bound by a namespace declaration, `""` for the default namespace
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.name == "xmlns" {
            Some("")
        } else {
            self.name.strip_prefix("xmlns:")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// `<?xml ...?>` declaration carried through a parse/serialize cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    declaration: Option<Declaration>,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn with_prefix(name: &str, from: &str, to: &str) -> Option<String> {
    match split_qname(name) {
        (Some(prefix), local) if prefix == from => Some(format!("{to}:{local}")),
        _ => None,
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
            doctype: None,
        }
    }

    pub fn document_node(&self) -> NodeId {
        NodeId(0)
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    pub fn set_declaration(&mut self, declaration: Option<Declaration>) {
        self.declaration = declaration;
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype(&mut self, doctype: Option<String>) {
        self.doctype = doctype;
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.document_node())
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    // ------------------------------------------------------------------
    // Queries

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    /// Text and CDATA nodes both carry character data
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_) | NodeKind::CData(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// All descendants in document order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    /// True when the node can be reached from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.document_node() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Qualified element name
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.name(id).and_then(|n| split_qname(n).0)
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|n| split_qname(n).1)
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Character data of a text, CDATA or comment node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(s) | NodeKind::CData(s) | NodeKind::Comment(s) => Some(s),
            _ => None,
        }
    }

    /// Concatenated character data of all text descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if self.is_text(id) {
            return self.text(id).unwrap_or_default().to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .filter_map(|n| self.text(n))
            .collect()
    }

    // ------------------------------------------------------------------
    // Namespaces

    /// Resolve `prefix` (empty for the default namespace) walking up from `id`
    pub fn namespace_for_prefix(&self, id: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(decl) = self
                .attributes(node)
                .iter()
                .find(|a| a.declared_prefix() == Some(prefix))
            {
                return if decl.value.is_empty() {
                    None
                } else {
                    Some(decl.value.as_str())
                };
            }
            current = self.parent(node);
        }
        None
    }

    /// A prefix in scope at `id` that resolves to `uri`
    pub fn prefix_for_namespace(&self, id: NodeId, uri: &str) -> Option<String> {
        let mut current = Some(id);
        while let Some(node) = current {
            for attr in self.attributes(node) {
                if attr.value != uri {
                    continue;
                }
                if let Some(prefix) = attr.declared_prefix() {
                    if self.namespace_for_prefix(id, prefix) == Some(uri) {
                        return Some(prefix.to_string());
                    }
                }
            }
            current = self.parent(node);
        }
        None
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let name = self.name(id)?;
        let prefix = split_qname(name).0.unwrap_or("");
        self.namespace_for_prefix(id, prefix)
    }

    /// Unprefixed attributes are in no namespace
    pub fn attribute_namespace(&self, id: NodeId, attr: &Attribute) -> Option<&str> {
        if attr.is_namespace_declaration() {
            return None;
        }
        attr.prefix()
            .and_then(|prefix| self.namespace_for_prefix(id, prefix))
    }

    /// Qualified name of the attribute with local name `local` in namespace `uri`
    pub fn attribute_name_in(&self, id: NodeId, uri: &str, local: &str) -> Option<String> {
        self.attributes(id)
            .iter()
            .find(|a| a.local_name() == local && self.attribute_namespace(id, a) == Some(uri))
            .map(|a| a.name.clone())
    }

    // ------------------------------------------------------------------
    // Construction and mutation

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind)
    }

    /// Unlink `id` from its parent; a no-op for detached nodes
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as the preceding sibling of `reference`
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let parent = self.parent(reference).ok_or(MarkupError::Detached)?;
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or(MarkupError::Detached)?;
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `child` directly after `reference`
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(MarkupError::Detached)?;
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, child),
            None => {
                self.append_child(parent, child);
                Ok(())
            }
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&c| c == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn remove_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace all content of `id` with a single text node
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.remove_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Replace the payload of a text or CDATA node
    pub fn set_node_text(&mut self, id: NodeId, text: impl Into<String>) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(s) | NodeKind::CData(s) | NodeKind::Comment(s) => *s = text.into(),
            _ => {}
        }
    }

    pub fn rename(&mut self, id: NodeId, new_name: impl Into<String>) {
        if let NodeKind::Element { name, .. } = &mut self.nodes[id.0].kind {
            *name = new_name.into();
        }
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attributes) = self.attributes_mut(id) {
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => attributes.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attributes = self.attributes_mut(id)?;
        let position = attributes.iter().position(|a| a.name == name)?;
        Some(attributes.remove(position).value)
    }

    pub fn retain_attributes<F>(&mut self, id: NodeId, keep: F)
    where
        F: FnMut(&Attribute) -> bool,
    {
        if let Some(attributes) = self.attributes_mut(id) {
            attributes.retain(keep);
        }
    }

    /// Merge adjacent text children of `id`
    pub fn merge_text(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous: Option<NodeId> = None;
        for child in children {
            let is_plain_text = matches!(self.kind(child), NodeKind::Text(_));
            match previous {
                Some(prev) if is_plain_text => {
                    let addition = self.text(child).unwrap_or_default().to_string();
                    if let NodeKind::Text(s) = &mut self.nodes[prev.0].kind {
                        s.push_str(&addition);
                    }
                    self.detach(child);
                }
                _ => previous = if is_plain_text { Some(child) } else { None },
            }
        }
    }

    // ------------------------------------------------------------------
    // Copying

    /// Deep copy of `id` inside this document, returned detached
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        let copy = self.push(kind);
        for child in self.children(id).to_vec() {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Deep copy of `id` from `source` into this document, returned detached
    pub fn import_subtree(&mut self, source: &Document, id: NodeId) -> NodeId {
        let kind = match source.kind(id) {
            NodeKind::Document => NodeKind::Element {
                name: String::from("document"),
                attributes: Vec::new(),
            },
            other => other.clone(),
        };
        let copy = self.push(kind);
        for &child in source.children(id) {
            let child_copy = self.import_subtree(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Rename every use of `from` into `to` on `id` and its descendants
    pub fn rename_prefix(&mut self, id: NodeId, from: &str, to: &str) {
        let mut nodes = vec![id];
        nodes.extend(self.descendants(id));
        for node in nodes {
            if let NodeKind::Element { name, attributes } = &mut self.nodes[node.0].kind {
                if let Some(renamed) = with_prefix(name, from, to) {
                    *name = renamed;
                }
                for attr in attributes.iter_mut() {
                    if attr.is_namespace_declaration() {
                        continue;
                    }
                    if let Some(renamed) = with_prefix(&attr.name, from, to) {
                        attr.name = renamed;
                    }
                }
            }
        }
    }
}
