//! Error types for document parsing and serialization

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, MarkupError>;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("UTF-8 error: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unbalanced markup: element '{0}' is never closed")]
    Unclosed(String),

    #[error("Document has no root element")]
    NoRootElement,

    #[error("Node has no parent")]
    Detached,
}
