//! XML/XHTML document model for the template engine.
//!
//! The document is an arena of nodes addressed by [`NodeId`]. Parsing and serialization go
//! through quick-xml; everything else (namespace resolution, subtree copies between documents,
//! in-place surgery) works on the arena.

mod compare;
pub mod document;
pub mod error;
mod reader;
mod writer;

pub use document::{Attribute, Declaration, Document, NodeId, NodeKind, XML_NAMESPACE};
pub use error::{MarkupError, Result};
