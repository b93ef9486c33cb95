//! Fragment specifications and selectors
//!
//! `~{template :: selector(args)}` evaluates to a [`FragmentSpec`]. Specs travel through the
//! expression language as plain [`Value`] objects (so they can be bound in a scope and passed
//! as fragment parameters) and are decoded again by the tag processor when a directive needs
//! the nodes.
//!
//! Selectors are a small subset of XPath: a list of steps, each with an axis (`/` or `//`), a
//! node test and predicates. A bare name matches an element by name or by a `ref`/`fragment`
//! marker attribute in the directive namespace whose value starts with that name.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thyme_markup::{Document, NodeId, NodeKind};

use crate::error::{Error, Result};
use crate::value::{Object, Value};

const FRAGMENT_SPEC: &str = "fragment-spec";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "name")]
pub enum NodeTest {
    /// `*`
    AnyElement,
    /// An element with this qualified name
    Name(String),
    /// An element named so, or carrying a fragment marker starting with the name
    Fragment(String),
    /// `text()`, CDATA included
    Text,
    /// `comment()`
    Comment,
    /// `node()`
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Predicate {
    AttributeEquals { name: String, value: String },
    AttributeExists { name: String },
    Class { name: String },
    /// One-based position among the nodes matched by the step
    Position { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    #[serde(default)]
    pub predicates: Vec<Predicate>,
}

impl Step {
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub steps: Vec<Step>,
    /// Selected by `#id`; the copied `id` attribute is dropped
    pub by_id: bool,
    /// Actual arguments of a parameterized fragment reference
    pub params: Vec<Value>,
}

impl Selector {
    /// `//*[@id='id']`
    pub fn by_id(id: &str) -> Self {
        let mut step = Step::new(Axis::Descendant, NodeTest::AnyElement);
        step.predicates.push(Predicate::AttributeEquals {
            name: String::from("id"),
            value: id.to_string(),
        });
        Self {
            steps: vec![step],
            by_id: true,
            params: Vec::new(),
        }
    }

    /// `//name`, matching element names and fragment markers
    pub fn by_fragment_name(name: &str) -> Self {
        Self {
            steps: vec![Step::new(Axis::Descendant, NodeTest::Fragment(name.to_string()))],
            by_id: false,
            params: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Evaluate against `doc`, starting at the document node. Markers are looked up in
    /// namespace `ns`. Results are in step order without duplicates.
    pub fn select(&self, doc: &Document, ns: &str) -> Vec<NodeId> {
        if self.steps.is_empty() {
            return Vec::new();
        }

        let mut contexts = vec![doc.document_node()];

        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();

            for &context in &contexts {
                let candidates = match step.axis {
                    Axis::Child => doc.children(context).to_vec(),
                    Axis::Descendant => doc.descendants(context),
                };

                let mut matched: Vec<NodeId> = candidates
                    .into_iter()
                    .filter(|&n| test_matches(doc, n, &step.test, ns))
                    .collect();

                for predicate in &step.predicates {
                    matched = match predicate {
                        Predicate::Position { index } => matched
                            .get(index.wrapping_sub(1))
                            .copied()
                            .into_iter()
                            .collect(),
                        _ => matched
                            .into_iter()
                            .filter(|&n| predicate_matches(doc, n, predicate))
                            .collect(),
                    };
                }

                for node in matched {
                    if seen.insert(node) {
                        next.push(node);
                    }
                }
            }

            contexts = next;
        }

        contexts
    }
}

fn test_matches(doc: &Document, node: NodeId, test: &NodeTest, ns: &str) -> bool {
    match test {
        NodeTest::AnyElement => doc.is_element(node),
        NodeTest::Name(name) => doc.name(node) == Some(name.as_str()),
        NodeTest::Fragment(name) => {
            if !doc.is_element(node) {
                return false;
            }
            doc.name(node) == Some(name.as_str())
                || doc.attributes(node).iter().any(|a| {
                    matches!(a.local_name(), "ref" | "fragment")
                        && doc.attribute_namespace(node, a) == Some(ns)
                        && a.value.starts_with(name.as_str())
                })
        }
        NodeTest::Text => doc.is_text(node),
        NodeTest::Comment => matches!(doc.kind(node), NodeKind::Comment(_)),
        NodeTest::Node => true,
    }
}

fn predicate_matches(doc: &Document, node: NodeId, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::AttributeEquals { name, value } => {
            doc.attribute(node, name) == Some(value.as_str())
        }
        Predicate::AttributeExists { name } => doc.attribute(node, name).is_some(),
        Predicate::Class { name } => doc
            .attribute(node, "class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == name)),
        Predicate::Position { .. } => true,
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            f.write_str(match step.axis {
                Axis::Child => "/",
                Axis::Descendant => "//",
            })?;
            match &step.test {
                NodeTest::AnyElement => f.write_str("*")?,
                NodeTest::Name(name) => f.write_str(name)?,
                NodeTest::Fragment(name) => write!(f, "*[name()='{name}' or fragment('{name}')]")?,
                NodeTest::Text => f.write_str("text()")?,
                NodeTest::Comment => f.write_str("comment()")?,
                NodeTest::Node => f.write_str("node()")?,
            }
            for predicate in &step.predicates {
                match predicate {
                    Predicate::AttributeEquals { name, value } => {
                        write!(f, "[@{name}='{value}']")?
                    }
                    Predicate::AttributeExists { name } => write!(f, "[@{name}]")?,
                    Predicate::Class { name } => write!(f, "[@class='{name}']")?,
                    Predicate::Position { index } => write!(f, "[{index}]")?,
                }
            }
        }
        Ok(())
    }
}

/// A parsed `~{template :: selector}` reference
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpec {
    /// Template name; `this` or empty refers to the template being processed
    pub template: String,
    pub selector: Selector,
}

impl FragmentSpec {
    pub fn new(template: impl Into<String>, selector: Selector) -> Self {
        Self {
            template: template.into(),
            selector,
        }
    }

    pub fn refers_to_current(&self) -> bool {
        self.template.is_empty() || self.template == "this"
    }

    /// Parse the shorthand string form `template :: name` or `template :: #id`
    pub fn parse_shorthand(spec: &str) -> Result<FragmentSpec> {
        static SHORTHAND: OnceLock<Regex> = OnceLock::new();
        let rx = SHORTHAND.get_or_init(|| {
            Regex::new(r"^\s*(\S*)\s*::\s*(#?[-_[:alnum:]]+)$")
                .expect("fragment shorthand regex must compile")
        });

        let captures = rx.captures(spec).ok_or_else(|| {
            Error::InvalidFragmentSpec(String::from(
                "Invalid attribute value for :include/insert/replace",
            ))
        })?;

        let template = captures.get(1).map_or("", |m| m.as_str());
        let name = captures.get(2).map_or("", |m| m.as_str());

        let selector = match name.strip_prefix('#') {
            Some(id) => Selector::by_id(id),
            None => Selector::by_fragment_name(name),
        };

        Ok(FragmentSpec::new(template, selector))
    }

    /// Encode as an expression value
    pub fn to_value(&self) -> Value {
        let mut selector = Object::new();
        selector.insert(String::from("xpath"), Value::from(self.selector.to_string()));
        selector.insert(String::from("by-id"), Value::Boolean(self.selector.by_id));
        selector.insert(
            String::from("params"),
            Value::Array(self.selector.params.clone()),
        );
        selector.insert(
            String::from("steps"),
            serde_json::to_value(&self.selector.steps)
                .map(Value::from)
                .unwrap_or_default(),
        );

        let mut spec = Object::new();
        spec.insert(String::from(FRAGMENT_SPEC), Value::Boolean(true));
        spec.insert(String::from("template"), Value::from(self.template.clone()));
        spec.insert(String::from("selector"), Value::Object(selector));
        Value::Object(spec)
    }

    /// Decode a value produced by [`FragmentSpec::to_value`]
    pub fn from_value(value: &Value) -> Option<FragmentSpec> {
        if !Self::is_spec(value) {
            return None;
        }

        let template = value.get("template").map(Value::to_text).unwrap_or_default();
        let selector = value.get("selector");

        let steps = selector
            .and_then(|s| s.get("steps"))
            .filter(|s| !s.is_null())
            .and_then(|s| serde_json::to_value(s).ok())
            .and_then(|s| serde_json::from_value::<Vec<Step>>(s).ok())
            .unwrap_or_default();

        let by_id = selector
            .and_then(|s| s.get("by-id"))
            .is_some_and(Value::is_truthy);

        let params = selector
            .and_then(|s| s.get("params"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Some(FragmentSpec {
            template,
            selector: Selector {
                steps,
                by_id,
                params,
            },
        })
    }

    pub fn is_spec(value: &Value) -> bool {
        value.get(FRAGMENT_SPEC).is_some_and(Value::is_truthy)
    }
}

impl fmt::Display for FragmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: {}", self.template, self.selector)
    }
}
