//! Processor configuration

use serde::Deserialize;

/// Namespace URI of the directive attributes
pub const DEFAULT_NAMESPACE: &str = "http://www.hekkelman.com/libzeep/m2";

/// Settings for the tag processor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    /// Namespace URI identifying directive attributes and elements
    pub namespace: String,
    /// Extensions tried, in order, when a fragment names another template
    pub extensions: Vec<String>,
    /// Scopes nested deeper than this abort processing of the element
    pub max_scope_depth: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            namespace: String::from(DEFAULT_NAMESPACE),
            extensions: ["", ".xhtml", ".html", ".xml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_scope_depth: 1000,
        }
    }
}

impl ProcessorOptions {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}
