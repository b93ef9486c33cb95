//! Captured node sets
//!
//! A [`NodeSet`] owns copies of the nodes a fragment selector matched, stored in a private
//! document. Copies are self-contained: every namespace prefix used inside a copy is declared
//! on its root. Consumers import a fresh copy into their own document, so one captured set can
//! be inserted any number of times.

use std::collections::BTreeSet;

use thyme_markup::{Document, NodeId, NodeKind};

use crate::error::Result;
use crate::value::Value;

const IS_NODE_SET: &str = "is-node-set";
const NODE_SET_NAME: &str = "node-set-name";

#[derive(Debug, Clone)]
pub struct CapturedNode {
    id: NodeId,
    /// Formal parameter names from the `fragment="name(a, b)"` marker
    parameters: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    doc: Document,
    nodes: Vec<CapturedNode>,
}

/// Parameter names declared by a fragment marker value, `f(a, b)` gives `a` and `b`
pub fn fragment_parameters(marker: &str) -> Vec<String> {
    let Some(open) = marker.find('(') else {
        return Vec::new();
    };
    let inner = &marker[open + 1..];
    let inner = inner.split(')').next().unwrap_or(inner);
    inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Prefixes used by element and attribute names in the subtree at `id`
fn used_prefixes(doc: &Document, id: NodeId) -> BTreeSet<String> {
    let mut prefixes = BTreeSet::new();
    let mut nodes = vec![id];
    nodes.extend(doc.descendants(id));

    for node in nodes {
        if !doc.is_element(node) {
            continue;
        }
        prefixes.insert(doc.prefix(node).unwrap_or("").to_string());
        for attr in doc.attributes(node) {
            if attr.is_namespace_declaration() {
                continue;
            }
            if let Some(prefix) = attr.prefix() {
                if prefix != "xml" {
                    prefixes.insert(prefix.to_string());
                }
            }
        }
    }
    prefixes
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy `node` out of `source`. The copy loses its `id` when it was selected by id and
    /// loses the `ref`/`fragment` markers in namespace `ns` after their parameter list has been
    /// recorded. It then gets the namespace declarations the remaining names need.
    pub fn capture(&mut self, source: &Document, node: NodeId, by_id: bool, ns: &str) {
        let copy = self.doc.import_subtree(source, node);

        let mut parameters = Vec::new();

        if source.is_element(node) {
            if by_id {
                self.doc.remove_attribute(copy, "id");
            }

            if let Some(name) = source.attribute_name_in(node, ns, "fragment") {
                parameters = fragment_parameters(source.attribute(node, &name).unwrap_or_default());
                self.doc.remove_attribute(copy, &name);
            }
            if let Some(name) = source.attribute_name_in(node, ns, "ref") {
                self.doc.remove_attribute(copy, &name);
            }

            for prefix in used_prefixes(&self.doc, copy) {
                let declared = self
                    .doc
                    .attributes(copy)
                    .iter()
                    .any(|a| a.declared_prefix() == Some(prefix.as_str()));
                if declared {
                    continue;
                }
                if let Some(uri) = source.namespace_for_prefix(node, &prefix) {
                    let name = if prefix.is_empty() {
                        String::from("xmlns")
                    } else {
                        format!("xmlns:{prefix}")
                    };
                    self.doc.set_attribute(copy, &name, uri);
                }
            }
        }

        self.nodes.push(CapturedNode {
            id: copy,
            parameters,
        });
    }

    /// Formal parameters of the captured node at `index`
    pub fn parameters(&self, index: usize) -> &[String] {
        self.nodes
            .get(index)
            .map(|n| n.parameters.as_slice())
            .unwrap_or_default()
    }

    /// Import a copy of every captured node into `dest`, to be inserted at `context`.
    /// Namespace declarations already in scope at `context` are dropped; a prefix bound to a
    /// URI the destination knows under another prefix is renamed to that prefix.
    pub fn import_into(&self, dest: &mut Document, context: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .map(|captured| {
                let copy = dest.import_subtree(&self.doc, captured.id);
                if dest.is_element(copy) {
                    reconcile_namespaces(dest, copy, context);
                }
                copy
            })
            .collect()
    }

    /// Serialized markup of all captured nodes
    pub fn to_markup(&self) -> Result<String> {
        let mut result = String::new();
        for captured in &self.nodes {
            match self.doc.kind(captured.id) {
                NodeKind::Text(text) | NodeKind::CData(text) => result.push_str(text),
                _ => result.push_str(&self.doc.node_to_xml(captured.id)?),
            }
        }
        Ok(result)
    }

    /// The value a scope variable holds when it refers to a node set stored under `name`
    pub fn marker(name: &str) -> Value {
        [
            (IS_NODE_SET, Value::Boolean(true)),
            (NODE_SET_NAME, Value::from(name)),
        ]
        .into_iter()
        .collect()
    }

    /// Name of the node set a marker value refers to
    pub fn marker_name(value: &Value) -> Option<&str> {
        if value.get(IS_NODE_SET).is_some_and(Value::is_truthy) {
            value.get(NODE_SET_NAME).and_then(Value::as_str)
        } else {
            None
        }
    }
}

/// Give `child`, about to be moved out from under the imported copy `root`, the declarations
/// from `root` that its subtree needs, then reconcile them with what is in scope at `context`
pub fn adopt_namespaces(dest: &mut Document, root: NodeId, child: NodeId, context: NodeId) {
    if !dest.is_element(child) {
        return;
    }

    for prefix in used_prefixes(dest, child) {
        let name = if prefix.is_empty() {
            String::from("xmlns")
        } else {
            format!("xmlns:{prefix}")
        };
        if dest.attribute(child, &name).is_some() {
            continue;
        }
        if let Some(uri) = dest.attribute(root, &name).map(str::to_string) {
            dest.set_attribute(child, &name, uri);
        }
    }

    reconcile_namespaces(dest, child, context);
}

fn reconcile_namespaces(dest: &mut Document, copy: NodeId, context: NodeId) {
    let declarations: Vec<(String, String, String)> = dest
        .attributes(copy)
        .iter()
        .filter_map(|a| {
            a.declared_prefix()
                .map(|p| (a.name.clone(), p.to_string(), a.value.clone()))
        })
        .collect();

    for (name, prefix, uri) in declarations {
        if dest.namespace_for_prefix(context, &prefix) == Some(uri.as_str()) {
            dest.remove_attribute(copy, &name);
            continue;
        }

        if prefix.is_empty() {
            continue;
        }

        if let Some(existing) = dest.prefix_for_namespace(context, &uri) {
            if !existing.is_empty() && existing != prefix {
                dest.rename_prefix(copy, &prefix, &existing);
                dest.remove_attribute(copy, &name);
            }
        }
    }
}
