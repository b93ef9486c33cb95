//! Thyme template engine
//!
//! An expression language interpreter and attribute directive processor for XHTML templates.
//!
//! # Pipeline
//!
//! ```text
//! Template file
//!      |
//!   Loader -> Document
//!      |
//! Tag processor (directives in precedence order, text substitution)
//!      |      \
//!      |   Interpreter -> Value   (one call per attribute or [[...]] occurrence)
//!      |
//! Post processing (remove, block, namespace cleanup) -> Document
//! ```
//!
//! Directive attributes live in a namespace (by default
//! `http://www.hekkelman.com/libzeep/m2`) so any prefix can be used in templates:
//!
//! ```xml
//! <ul xmlns:m="http://www.hekkelman.com/libzeep/m2">
//!   <li m:each="item, stat : ${items}" m:text="|${stat.count}. ${item}|">placeholder</li>
//! </ul>
//! ```

pub mod config;
pub mod directives;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod interpreter;
pub mod lexer;
pub mod loader;
pub mod locale;
pub mod nodeset;
pub mod processor;
pub mod request;
pub mod scope;
pub mod token;
pub mod utility;
pub mod value;

// Re-export main types
pub use config::{ProcessorOptions, DEFAULT_NAMESPACE};
pub use engine::TemplateProcessor;
pub use error::{Error, Result};
pub use fragment::{FragmentSpec, Selector};
pub use interpreter::{evaluate, evaluate_link, process, try_evaluate};
pub use loader::{FileLoader, TemplateLoader};
pub use locale::Locale;
pub use nodeset::NodeSet;
pub use processor::TagProcessor;
pub use request::{Request, SimpleRequest};
pub use scope::Scope;
pub use value::{Object, Value};
