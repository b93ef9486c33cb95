//! Chained variable environment
//!
//! A [`Scope`] is a frame holding variables, an optional selected object and captured node
//! sets. Child frames borrow their parent, so a scope never outlives the tree walk that
//! created it. Lookups never fail: a missing name is null.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::nodeset::NodeSet;
use crate::request::Request;
use crate::value::Value;

#[derive(Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    depth: usize,
    data: HashMap<String, Value>,
    selected: Option<Value>,
    nodesets: HashMap<String, NodeSet>,
    request: Option<&'a dyn Request>,
}

impl<'a> Scope<'a> {
    /// A root scope without a request
    pub fn new() -> Self {
        Self::default()
    }

    /// A root scope for rendering `request`
    pub fn with_request(request: &'a dyn Request) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    /// A child frame; variables put into it shadow the parent's
    pub fn nested(&self) -> Scope<'_> {
        Scope {
            parent: Some(self),
            depth: self.depth + 1,
            ..Scope::default()
        }
    }

    /// Number of frames above this one
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }

    /// Look up `name` walking up the chain. With `include_selected` the selected object of
    /// each frame is consulted after that frame's own variables.
    pub fn lookup(&self, name: &str, include_selected: bool) -> Value {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.data.get(name) {
                return value.clone();
            }
            if include_selected {
                if let Some(value) = scope.selected.as_ref().and_then(|s| s.get(name)) {
                    return value.clone();
                }
            }
            current = scope.parent;
        }
        Value::Null
    }

    /// Shorthand for a lookup that ignores selected objects
    pub fn get(&self, name: &str) -> Value {
        self.lookup(name, false)
    }

    /// Install the object `*{...}` expressions read from
    pub fn select_object(&mut self, value: Value) {
        self.selected = Some(value);
    }

    pub fn set_nodeset(&mut self, name: impl Into<String>, nodes: NodeSet) {
        self.nodesets.insert(name.into(), nodes);
    }

    /// A copy of the node set stored under `name`, empty when there is none
    pub fn get_nodeset(&self, name: &str) -> NodeSet {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(nodes) = scope.nodesets.get(name) {
                return nodes.clone();
            }
            current = scope.parent;
        }
        NodeSet::default()
    }

    /// The request this scope chain renders for
    pub fn get_request(&self) -> Result<&'a dyn Request> {
        let mut scope = self;
        loop {
            if let Some(request) = scope.request {
                return Ok(request);
            }
            match scope.parent {
                Some(parent) => scope = parent,
                None => return Err(Error::ScopeHasNoRequest),
            }
        }
    }

    /// Context name of the request, empty without one
    pub fn context_name(&self) -> String {
        self.get_request()
            .map(|r| r.context_name().to_string())
            .unwrap_or_default()
    }

    /// Credentials exposed by the request, null without one
    pub fn credentials(&self) -> Value {
        self.get_request()
            .map(|r| r.credentials())
            .unwrap_or_default()
    }
}
