//! Template processor front end
//!
//! Owns a [`TemplateLoader`] and the processor options, loads templates by name (optionally
//! narrowed to one fragment) and runs the tag processor over them.

use std::path::{Path, PathBuf};

use thyme_markup::Document;

use crate::config::ProcessorOptions;
use crate::error::{Error, Result};
use crate::fragment::FragmentSpec;
use crate::interpreter;
use crate::loader::{locate_template, FileLoader, TemplateLoader};
use crate::nodeset::NodeSet;
use crate::processor::TagProcessor;
use crate::scope::Scope;

pub struct TemplateProcessor {
    loader: Box<dyn TemplateLoader>,
    options: ProcessorOptions,
}

impl TemplateProcessor {
    pub fn new(loader: Box<dyn TemplateLoader>, options: ProcessorOptions) -> Self {
        Self { loader, options }
    }

    /// A processor reading templates from `docroot` with default options
    pub fn with_docroot(docroot: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(
            Box::new(FileLoader::new(docroot)?),
            ProcessorOptions::default(),
        ))
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    pub fn loader(&self) -> &dyn TemplateLoader {
        self.loader.as_ref()
    }

    /// Load the template `name`. When no file by that name exists, `name` is read as a
    /// fragment reference (`file :: selector` or `~{file :: selector}`) and the document
    /// returned holds only the first matching element.
    pub fn load_template(&self, name: &str) -> Result<Document> {
        let extensions = &self.options.extensions;

        if let Some(path) = locate_template(self.loader(), Path::new(name), extensions) {
            return self.loader.load_template(&path);
        }

        let spec = match FragmentSpec::parse_shorthand(name) {
            Ok(spec) => spec,
            Err(_) => {
                let value = interpreter::try_evaluate_link(&Scope::new(), name)?;
                FragmentSpec::from_value(&value)
                    .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?
            }
        };

        let path = locate_template(self.loader(), Path::new(&spec.template), extensions)
            .ok_or_else(|| Error::TemplateNotFound(spec.template.clone()))?;
        let source = self.loader.load_template(&path)?;

        let ns = &self.options.namespace;
        let node = spec
            .selector
            .select(&source, ns)
            .into_iter()
            .find(|&n| source.is_element(n))
            .ok_or_else(|| Error::FragmentNotFound(spec.to_string()))?;

        let mut nodes = NodeSet::new();
        nodes.capture(&source, node, spec.selector.by_id, ns);

        let mut doc = Document::new();
        let top = doc.document_node();
        for copy in nodes.import_into(&mut doc, top) {
            doc.append_child(top, copy);
        }
        Ok(doc)
    }

    /// Run the tag processor over the root element of `doc`; other templates are looked up
    /// relative to `dir`
    pub fn process(&self, doc: &mut Document, dir: &Path, scope: &Scope<'_>) -> Result<()> {
        let Some(root) = doc.root_element() else {
            return Ok(());
        };

        let mut processor = TagProcessor::new(&self.options, self.loader(), dir);
        processor.process(doc, root, scope)
    }

    /// Load, process and serialize the template `name`
    pub fn render(&self, name: &str, scope: &Scope<'_>) -> Result<String> {
        let mut doc = self.load_template(name)?;
        let dir = Path::new(name)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.process(&mut doc, &dir, scope)?;
        tracing::debug!(template = name, "rendered template");

        Ok(doc.to_xml()?)
    }
}
