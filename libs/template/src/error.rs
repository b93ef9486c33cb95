//! Error types for the template engine

use thiserror::Error;
use thyme_markup::MarkupError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Expression and tag processing errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid operand kind: {0}")]
    InvalidOperandKind(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Undefined utility method: {0}")]
    UndefinedUtilityMethod(String),

    #[error("Fragment not found: {0}")]
    FragmentNotFound(String),

    #[error("Could not locate template file {0}")]
    TemplateNotFound(String),

    #[error("{0}")]
    InvalidFragmentSpec(String),

    #[error("Invalid attribute value for {0}")]
    InvalidAttributeValue(String),

    #[error("Assertion failed for '{0}'")]
    AssertionFailed(String),

    #[error("Invalid scope, no request")]
    ScopeHasNoRequest,

    #[error("Scope stack overflow (depth {0})")]
    ScopeTooDeep(usize),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors that indicate the engine was wired incorrectly by its host. These propagate out
    /// of the tree walk instead of being rendered inline.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::ScopeHasNoRequest)
    }

    /// Errors that abort the whole tree walk: contract violations and runaway nesting
    pub fn is_fatal(&self) -> bool {
        self.is_contract_violation() || matches!(self, Error::ScopeTooDeep(_))
    }
}
