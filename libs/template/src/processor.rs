//! Tag processor
//!
//! Walks a document, running the directive attributes of every element in precedence order,
//! substituting `[[...]]` and `[(...)]` in text, and finally stripping everything in the
//! directive namespace in a post-order pass.
//!
//! Failures inside one element are rendered as a text node in front of that element and do not
//! stop the walk. Only fatal errors (see [`Error::is_fatal`]) propagate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thyme_markup::{Document, NodeId, NodeKind};

use crate::config::ProcessorOptions;
use crate::directives::{attribute_precedence, is_boolean_attribute, AttributeAction, Directive};
use crate::error::{Error, Result};
use crate::fragment::FragmentSpec;
use crate::interpreter;
use crate::loader::{locate_template, TemplateLoader};
use crate::nodeset::{adopt_namespaces, NodeSet};
use crate::scope::Scope;
use crate::value::Value;

/// Per element bookkeeping while its directives run
#[derive(Default)]
struct ElementState {
    /// Text children were consumed by an `inline` directive
    inlined: bool,
    /// Children a directive already processed
    handled: HashSet<NodeId>,
}

enum Segment {
    Text(String),
    Markup(String),
}

fn each_regex() -> &'static Regex {
    static EACH: OnceLock<Regex> = OnceLock::new();
    EACH.get_or_init(|| {
        Regex::new(r"^\s*(\w+)(?:\s*,\s*(\w+))?\s*:\s*(.+)$").expect("each regex must compile")
    })
}

fn inline_script_regex() -> &'static Regex {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    INLINE.get_or_init(|| {
        Regex::new(
            r#"/\*\[\[(?P<commented>.+?)\]\]\*/\s*(?:'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|[^;\n])*|\[\[(?P<bare>.+?)\]\]"#,
        )
        .expect("inline script regex must compile")
    })
}

fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// Start of the next `[[` or `[(` in `text`, and whether it is the raw form
fn find_inline_expression(text: &str) -> Option<(usize, bool)> {
    let bytes = text.as_bytes();
    text.match_indices('[')
        .find_map(|(i, _)| match bytes.get(i + 1) {
            Some(b'[') => Some((i, false)),
            Some(b'(') => Some((i, true)),
            _ => None,
        })
}

/// Processes one template document
pub struct TagProcessor<'p> {
    options: &'p ProcessorOptions,
    loader: &'p dyn TemplateLoader,
    /// Directory other templates are resolved against
    dir: PathBuf,
    /// The document as it was before processing; `this` fragments are selected from it
    template: Document,
}

impl<'p> TagProcessor<'p> {
    pub fn new(
        options: &'p ProcessorOptions,
        loader: &'p dyn TemplateLoader,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            options,
            loader,
            dir: dir.into(),
            template: Document::new(),
        }
    }

    fn ns(&self) -> &str {
        &self.options.namespace
    }

    /// Process `node` and everything below it, then strip the directive namespace
    pub fn process(&mut self, doc: &mut Document, node: NodeId, scope: &Scope<'_>) -> Result<()> {
        self.template = doc.clone();

        self.process_node(doc, node, scope)?;

        if doc.is_element(node) && doc.parent(node).is_some() {
            self.post_process(doc, node)?;
        }
        Ok(())
    }

    fn process_node(&self, doc: &mut Document, node: NodeId, scope: &Scope<'_>) -> Result<()> {
        match doc.kind(node) {
            NodeKind::Text(_) | NodeKind::CData(_) => {
                self.process_text(doc, node, scope)?;
                Ok(())
            }
            NodeKind::Element { .. } => self.process_element(doc, node, scope),
            NodeKind::Comment(_) | NodeKind::Document => Ok(()),
        }
    }

    fn process_element(&self, doc: &mut Document, e: NodeId, parent: &Scope<'_>) -> Result<()> {
        let mut scope = parent.nested();
        if scope.depth() > self.options.max_scope_depth {
            return Err(Error::ScopeTooDeep(scope.depth()));
        }

        let mut state = ElementState::default();

        match self.process_directives(doc, e, &mut scope, &mut state) {
            Ok(AttributeAction::Remove) => {
                doc.detach(e);
                return Ok(());
            }
            Ok(AttributeAction::None) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                let name = doc.name(e).unwrap_or_default().to_string();
                tracing::warn!(element = %name, error = %err, "error processing element");
                let note = doc.create_text(format!("Error processing element '{name}': {err}"));
                doc.insert_before(e, note)?;
            }
        }

        for child in doc.children(e).to_vec() {
            if doc.parent(child) != Some(e) || state.handled.contains(&child) {
                continue;
            }
            if state.inlined && doc.is_text(child) {
                continue;
            }
            self.process_node(doc, child, &scope)?;
        }

        Ok(())
    }

    fn process_directives(
        &self,
        doc: &mut Document,
        e: NodeId,
        scope: &mut Scope<'_>,
        state: &mut ElementState,
    ) -> Result<AttributeAction> {
        let ns = self.ns();
        let mut directives: Vec<(String, String)> = doc
            .attributes(e)
            .iter()
            .filter(|a| !a.is_namespace_declaration())
            .filter(|a| doc.attribute_namespace(e, a) == Some(ns))
            .filter(|a| !Directive::from_name(a.local_name()).is_some_and(Directive::is_post_processed))
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();

        directives.sort_by_key(|(name, _)| attribute_precedence(local_part(name)));

        for (name, value) in directives {
            if doc.attribute(e, &name).is_none() {
                continue;
            }

            let action = self.dispatch(doc, e, &name, &value, scope, state)?;
            if action == AttributeAction::Remove {
                return Ok(action);
            }
            doc.remove_attribute(e, &name);
        }

        Ok(AttributeAction::None)
    }

    fn dispatch(
        &self,
        doc: &mut Document,
        e: NodeId,
        name: &str,
        value: &str,
        scope: &mut Scope<'_>,
        state: &mut ElementState,
    ) -> Result<AttributeAction> {
        let local = local_part(name);

        match Directive::from_name(local) {
            Some(Directive::If) => self.process_if(scope, value, false),
            Some(Directive::Unless) => self.process_if(scope, value, true),
            Some(Directive::Assert) => {
                if !interpreter::evaluate_assert(scope, value)? {
                    return Err(Error::AssertionFailed(value.to_string()));
                }
                Ok(AttributeAction::None)
            }
            Some(Directive::Text) => self.process_text_directive(doc, e, value, scope, state, true),
            Some(Directive::UText) => {
                self.process_text_directive(doc, e, value, scope, state, false)
            }
            Some(Directive::Switch) => self.process_switch(doc, e, value, scope),
            Some(Directive::Each) => self.process_each(doc, e, name, value, scope),
            Some(Directive::Attr) => {
                for (attr, text) in interpreter::evaluate_attr(scope, value)? {
                    doc.set_attribute(e, &attr, text);
                }
                Ok(AttributeAction::None)
            }
            Some(Directive::AttrAppend) => self.process_attr_extend(doc, e, value, scope, true),
            Some(Directive::AttrPrepend) => self.process_attr_extend(doc, e, value, scope, false),
            Some(Directive::ClassAppend) => self.process_append(doc, e, value, scope, "class"),
            Some(Directive::StyleAppend) => self.process_append(doc, e, value, scope, "style"),
            Some(Directive::With) => {
                for (var, bound) in interpreter::evaluate_with(scope, value)? {
                    self.bind(scope, &var, bound)?;
                }
                Ok(AttributeAction::None)
            }
            Some(Directive::Object) => {
                let selected = interpreter::evaluate(scope, value)?;
                scope.select_object(selected);
                Ok(AttributeAction::None)
            }
            Some(Directive::Inline) => {
                state.inlined = true;
                self.process_inline(doc, e, value, scope, state)
            }
            Some(mode @ (Directive::Insert | Directive::Replace | Directive::Include)) => {
                self.process_include(doc, e, value, scope, mode, state)
            }
            Some(Directive::Case | Directive::Ref | Directive::Fragment | Directive::Remove) => {
                Ok(AttributeAction::None)
            }
            Some(Directive::Block) | None if is_boolean_attribute(local) => {
                if interpreter::evaluate(scope, value)?.is_truthy() {
                    doc.set_attribute(e, local, local);
                } else {
                    doc.remove_attribute(e, local);
                }
                Ok(AttributeAction::None)
            }
            Some(Directive::Block) | None => {
                let text = interpreter::evaluate(scope, value)?.to_text();
                doc.set_attribute(e, local, text);
                Ok(AttributeAction::None)
            }
        }
    }

    // ------------------------------------------------------------------
    // Directives

    fn process_if(&self, scope: &Scope<'_>, expr: &str, unless: bool) -> Result<AttributeAction> {
        if interpreter::evaluate(scope, expr)?.is_truthy() != unless {
            Ok(AttributeAction::None)
        } else {
            Ok(AttributeAction::Remove)
        }
    }

    fn process_text_directive(
        &self,
        doc: &mut Document,
        e: NodeId,
        expr: &str,
        scope: &Scope<'_>,
        state: &mut ElementState,
        escaped: bool,
    ) -> Result<AttributeAction> {
        let value = interpreter::evaluate(scope, expr)?;
        if value.is_null() {
            return Ok(AttributeAction::None);
        }

        let text = match NodeSet::marker_name(&value) {
            Some(name) => scope.get_nodeset(name).to_markup()?,
            None => value.to_text(),
        };

        if escaped {
            doc.set_text(e, &text);
            state.handled.extend(doc.children(e).iter().copied());
        } else {
            doc.remove_children(e);
            for node in self.parse_markup(doc, &text)? {
                doc.append_child(e, node);
                state.handled.insert(node);
            }
        }

        Ok(AttributeAction::None)
    }

    /// Elements carrying a `case` attribute below `e`, not looking inside nested switches
    fn collect_cases(&self, doc: &Document, e: NodeId, cases: &mut Vec<(NodeId, String)>) {
        for child in doc.element_children(e) {
            if let Some(name) = doc.attribute_name_in(child, self.ns(), "case") {
                cases.push((child, name));
            }
            if doc.attribute_name_in(child, self.ns(), "switch").is_none() {
                self.collect_cases(doc, child, cases);
            }
        }
    }

    fn process_switch(
        &self,
        doc: &mut Document,
        e: NodeId,
        expr: &str,
        scope: &Scope<'_>,
    ) -> Result<AttributeAction> {
        let value = interpreter::evaluate(scope, expr)?.to_text();

        let mut cases = Vec::new();
        self.collect_cases(doc, e, &mut cases);

        let mut selected = None;
        let mut wildcard = None;

        for (node, name) in cases {
            let label = doc.attribute(node, &name).unwrap_or_default().to_string();
            if label == "*" {
                wildcard.get_or_insert((node, name));
                continue;
            }

            let mut evaluated = label.clone();
            if label == value || (interpreter::process(scope, &mut evaluated)? && evaluated == value)
            {
                selected = Some((node, name));
                break;
            }
        }

        doc.remove_children(e);

        if let Some((node, name)) = selected.or(wildcard) {
            doc.remove_attribute(node, &name);
            doc.append_child(e, node);
        }

        Ok(AttributeAction::None)
    }

    fn process_each(
        &self,
        doc: &mut Document,
        e: NodeId,
        name: &str,
        expr: &str,
        scope: &Scope<'_>,
    ) -> Result<AttributeAction> {
        let captures = each_regex()
            .captures(expr)
            .ok_or_else(|| Error::InvalidAttributeValue(String::from(":each")))?;

        let var = captures.get(1).map_or("", |m| m.as_str());
        let status = captures.get(2).map(|m| m.as_str());
        let collection = captures.get(3).map_or("", |m| m.as_str());

        if let Value::Array(items) = interpreter::evaluate(scope, collection)? {
            let size = items.len();

            for (index, item) in items.into_iter().enumerate() {
                let mut subscope = scope.nested();

                if let Some(status) = status {
                    let info: Value = [
                        ("count", Value::from(index + 1)),
                        ("current", item.clone()),
                        ("even", Value::Boolean(index % 2 == 1)),
                        ("first", Value::Boolean(index == 0)),
                        ("index", Value::from(index)),
                        ("last", Value::Boolean(index + 1 == size)),
                        ("odd", Value::Boolean(index % 2 == 0)),
                        ("size", Value::from(size)),
                    ]
                    .into_iter()
                    .collect();
                    subscope.put(status, info);
                }
                subscope.put(var, item);

                let clone = doc.clone_subtree(e);
                doc.remove_attribute(clone, name);
                doc.insert_before(e, clone)?;

                self.process_node(doc, clone, &subscope)?;
            }
        }

        Ok(AttributeAction::Remove)
    }

    fn process_attr_extend(
        &self,
        doc: &mut Document,
        e: NodeId,
        expr: &str,
        scope: &Scope<'_>,
        append: bool,
    ) -> Result<AttributeAction> {
        for (name, text) in interpreter::evaluate_attr(scope, expr)? {
            let existing = doc.attribute(e, &name).unwrap_or_default();
            let combined = if append {
                format!("{existing}{text}")
            } else {
                format!("{text}{existing}")
            };
            doc.set_attribute(e, &name, combined);
        }
        Ok(AttributeAction::None)
    }

    /// `classappend` and `styleappend`. A value that does not parse is appended literally.
    fn process_append(
        &self,
        doc: &mut Document,
        e: NodeId,
        expr: &str,
        scope: &Scope<'_>,
        attribute: &str,
    ) -> Result<AttributeAction> {
        let text = match interpreter::try_evaluate(scope, expr) {
            Ok(value) => value.to_text(),
            Err(err) if err.is_fatal() => return Err(err),
            Err(_) => expr.to_string(),
        };

        let text = text.trim();
        if text.is_empty() {
            return Ok(AttributeAction::None);
        }

        let existing = doc
            .attribute(e, attribute)
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let combined = if attribute == "style" {
            let addition = if text.ends_with(';') {
                text.to_string()
            } else {
                format!("{text};")
            };
            match existing {
                Some(style) if style.ends_with(';') => format!("{style} {addition}"),
                Some(style) => format!("{style}; {addition}"),
                None => addition,
            }
        } else {
            match existing {
                Some(class) => format!("{class} {text}"),
                None => text.to_string(),
            }
        };

        doc.set_attribute(e, attribute, combined);
        Ok(AttributeAction::None)
    }

    fn process_inline(
        &self,
        doc: &mut Document,
        e: NodeId,
        mode: &str,
        scope: &Scope<'_>,
        state: &mut ElementState,
    ) -> Result<AttributeAction> {
        let texts: Vec<NodeId> = doc
            .children(e)
            .iter()
            .copied()
            .filter(|&c| doc.is_text(c))
            .collect();

        match mode.trim() {
            "javascript" | "css" => {
                for node in texts {
                    let text = doc.text(node).unwrap_or_default().to_string();
                    let replaced = self.inline_script(scope, &text)?;
                    doc.set_node_text(node, replaced);
                }
            }
            "none" => {}
            _ => {
                for node in texts {
                    state.handled.extend(self.process_text(doc, node, scope)?);
                }
            }
        }

        Ok(AttributeAction::None)
    }

    /// Substitute `/*[[expr]]*/ placeholder` and `[[expr]]` with the JSON form of the value
    fn inline_script(&self, scope: &Scope<'_>, text: &str) -> Result<String> {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        for captures in inline_script_regex().captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let expr = captures
                .name("commented")
                .or_else(|| captures.name("bare"))
                .map_or("", |m| m.as_str());

            result.push_str(&text[last..whole.start()]);
            let value = interpreter::evaluate(scope, expr)?;
            result.push_str(&value.to_json().replace("</", "<\\/"));
            last = whole.end();
        }

        result.push_str(&text[last..]);
        Ok(result)
    }

    fn process_include(
        &self,
        doc: &mut Document,
        e: NodeId,
        expr: &str,
        scope: &Scope<'_>,
        mode: Directive,
        state: &mut ElementState,
    ) -> Result<AttributeAction> {
        let spec = interpreter::try_evaluate_link(scope, expr)?;
        let nodes = self.resolve_fragment_spec(&spec, scope)?;
        if nodes.is_empty() {
            return Ok(AttributeAction::None);
        }

        let params = FragmentSpec::from_value(&spec)
            .map(|s| s.selector.params)
            .unwrap_or_default();

        let context = match (mode, doc.parent(e)) {
            (Directive::Replace, Some(parent)) => parent,
            _ => e,
        };
        let copies = nodes.import_into(doc, context);

        if mode == Directive::Include {
            doc.remove_children(e);
        }

        let mut action = AttributeAction::None;

        for (index, copy) in copies.into_iter().enumerate() {
            if !doc.is_element(copy) {
                if mode == Directive::Replace {
                    doc.insert_before(e, copy)?;
                    action = AttributeAction::Remove;
                } else {
                    doc.append_child(e, copy);
                    state.handled.insert(copy);
                }
                self.process_node(doc, copy, scope)?;
                continue;
            }

            let mut fragment_scope = scope.nested();
            for (name, actual) in nodes.parameters(index).iter().zip(&params) {
                self.bind(&mut fragment_scope, name, actual.clone())?;
            }

            match mode {
                Directive::Include => {
                    for child in doc.children(copy).to_vec() {
                        adopt_namespaces(doc, copy, child, e);
                        doc.append_child(e, child);
                        state.handled.insert(child);
                        self.process_node(doc, child, &fragment_scope)?;
                    }
                }
                Directive::Insert => {
                    doc.append_child(e, copy);
                    state.handled.insert(copy);
                    self.process_node(doc, copy, &fragment_scope)?;
                }
                _ => {
                    doc.insert_before(e, copy)?;
                    action = AttributeAction::Remove;
                    self.process_node(doc, copy, &fragment_scope)?;
                }
            }
        }

        Ok(action)
    }

    /// Bind `value` under `name`. Fragment references are resolved into a node set stored in
    /// the scope, with a marker value pointing at it.
    fn bind(&self, scope: &mut Scope<'_>, name: &str, value: Value) -> Result<()> {
        if value.as_object().is_some() {
            match self.resolve_fragment_spec(&value, scope) {
                Ok(nodes) if !nodes.is_empty() => {
                    scope.set_nodeset(name, nodes);
                    scope.put(name, NodeSet::marker(name));
                    return Ok(());
                }
                Ok(_) | Err(Error::FragmentNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        scope.put(name, value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fragments

    /// Collect the nodes a fragment reference points at. `spec` is a node set marker, a
    /// shorthand `template :: name` string or an encoded [`FragmentSpec`]; anything else
    /// yields an empty set.
    pub fn resolve_fragment_spec(&self, spec: &Value, scope: &Scope<'_>) -> Result<NodeSet> {
        if let Some(name) = NodeSet::marker_name(spec) {
            return Ok(scope.get_nodeset(name));
        }

        let spec = match spec {
            Value::String(s) => FragmentSpec::parse_shorthand(s)?,
            other => match FragmentSpec::from_value(other) {
                Some(spec) => spec,
                None => return Ok(NodeSet::new()),
            },
        };

        if spec.selector.is_empty() {
            return Ok(NodeSet::new());
        }

        let loaded;
        let source = if spec.refers_to_current() {
            &self.template
        } else {
            loaded = self.load(&spec.template)?;
            &loaded
        };

        let matches = spec.selector.select(source, self.ns());
        if matches.is_empty() {
            return Err(Error::FragmentNotFound(spec.to_string()));
        }

        tracing::debug!(fragment = %spec, count = matches.len(), "resolved fragment");

        let mut nodes = NodeSet::new();
        for node in matches {
            nodes.capture(source, node, spec.selector.by_id, self.ns());
        }
        Ok(nodes)
    }

    fn load(&self, template: &str) -> Result<Document> {
        let base = self.dir.join(template);
        let path = locate_template(self.loader, &base, &self.options.extensions)
            .ok_or_else(|| Error::TemplateNotFound(template.to_string()))?;
        self.loader.load_template(&path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ------------------------------------------------------------------
    // Text

    /// Substitute `[[expr]]` (escaped) and `[(expr)]` (raw) inside a text node. Raw results
    /// containing markup are parsed and spliced in after the node. Returns the nodes created.
    fn process_text(
        &self,
        doc: &mut Document,
        node: NodeId,
        scope: &Scope<'_>,
    ) -> Result<Vec<NodeId>> {
        let (text, splice) = match doc.kind(node) {
            NodeKind::Text(s) => (s.clone(), true),
            NodeKind::CData(s) => (s.clone(), false),
            _ => return Ok(Vec::new()),
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut rest = text.as_str();

        while let Some((start, raw)) = find_inline_expression(rest) {
            let body = start + 2;
            let Some(length) = rest[body..].find(if raw { ")]" } else { "]]" }) else {
                break;
            };
            let expr = &rest[body..body + length];

            current.push_str(&rest[..start]);

            let mut value = expr.to_string();
            if !interpreter::process(scope, &mut value)? {
                value = format!("Error processing {expr}");
            }

            if raw && splice && value.contains('<') {
                segments.push(Segment::Text(std::mem::take(&mut current)));
                segments.push(Segment::Markup(value));
            } else {
                current.push_str(&value);
            }

            rest = &rest[body + length + 2..];
        }
        current.push_str(rest);

        if segments.is_empty() {
            if current != text {
                doc.set_node_text(node, current);
            }
            return Ok(Vec::new());
        }
        segments.push(Segment::Text(current));

        let mut created = Vec::new();
        let mut anchor = node;
        let mut segments = segments.into_iter();

        if let Some(Segment::Text(first)) = segments.next() {
            doc.set_node_text(node, first);
        }

        for segment in segments {
            let nodes = match segment {
                Segment::Text(t) if t.is_empty() => continue,
                Segment::Text(t) => vec![doc.create_text(t)],
                Segment::Markup(markup) => match self.parse_markup(doc, &markup) {
                    Ok(nodes) => nodes,
                    Err(err) => {
                        tracing::warn!(error = %err, "inline markup does not parse");
                        vec![doc.create_text(markup)]
                    }
                },
            };

            for new_node in nodes {
                doc.insert_after(anchor, new_node)?;
                anchor = new_node;
                created.push(new_node);
            }
        }

        Ok(created)
    }

    /// Parse mixed content into detached nodes of `doc`
    fn parse_markup(&self, doc: &mut Document, text: &str) -> Result<Vec<NodeId>> {
        let (fragment, wrapper) = Document::parse_fragment(text)?;
        Ok(fragment
            .children(wrapper)
            .iter()
            .map(|&child| doc.import_subtree(&fragment, child))
            .collect())
    }

    // ------------------------------------------------------------------
    // Post processing

    /// Evaluate `remove`, unwrap `block` elements and drop every attribute in the directive
    /// namespace
    fn post_process(&self, doc: &mut Document, e: NodeId) -> Result<()> {
        let ns = self.ns().to_string();

        if let Some(name) = doc.attribute_name_in(e, &ns, "remove") {
            if doc.parent(e).is_some() {
                let mode = doc.attribute(e, &name).unwrap_or_default().trim().to_string();
                match mode.as_str() {
                    "all" => {
                        doc.detach(e);
                        return Ok(());
                    }
                    "body" => doc.remove_children(e),
                    "all-but-first" => {
                        let children = doc.children(e).to_vec();
                        if let Some(first) = children.iter().position(|&c| doc.is_element(c)) {
                            for &child in &children[first + 1..] {
                                doc.detach(child);
                            }
                        }
                    }
                    "tag" => {
                        self.strip_directives(doc, e);
                        return self.unwrap(doc, e);
                    }
                    _ => {}
                }
            }
        }

        self.strip_directives(doc, e);

        let is_block = doc.namespace_uri(e) == Some(ns.as_str())
            && doc.local_name(e) == Some("block");
        if is_block && doc.parent(e).is_some() {
            return self.unwrap(doc, e);
        }

        for child in doc.element_children(e) {
            self.post_process(doc, child)?;
        }

        doc.retain_attributes(e, |a| !(a.is_namespace_declaration() && a.value == ns));
        doc.merge_text(e);
        Ok(())
    }

    /// Replace `e` with its children
    fn unwrap(&self, doc: &mut Document, e: NodeId) -> Result<()> {
        let children = doc.children(e).to_vec();
        for &child in &children {
            doc.insert_before(e, child)?;
        }
        doc.detach(e);

        for child in children {
            if doc.is_element(child) {
                self.post_process(doc, child)?;
            }
        }
        Ok(())
    }

    fn strip_directives(&self, doc: &mut Document, e: NodeId) {
        let names: Vec<String> = doc
            .attributes(e)
            .iter()
            .filter(|a| !a.is_namespace_declaration())
            .filter(|a| doc.attribute_namespace(e, a) == Some(self.ns()))
            .map(|a| a.name.clone())
            .collect();

        for name in names {
            doc.remove_attribute(e, &name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_expressions_are_found() {
        assert_eq!(find_inline_expression("a [[x]]"), Some((2, false)));
        assert_eq!(find_inline_expression("[x] [(y)]"), Some((4, true)));
        assert_eq!(find_inline_expression("[x]"), None);
        assert_eq!(find_inline_expression("["), None);
    }

    #[test]
    fn each_attribute_grammar() {
        let captures = each_regex().captures("item, stat : ${items}").unwrap();
        assert_eq!(&captures[1], "item");
        assert_eq!(&captures[2], "stat");
        assert_eq!(&captures[3], "${items}");
        assert!(each_regex().captures("${items}").is_none());
    }
}
