//! Token types for the expression lexer

/// Token types for the expression lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literals
    Integer,
    Float,
    String,

    // Names, mapped to a reserved word when they match one
    Identifier,

    Assign, // =

    // Reserved words and operators
    And,
    Or,
    Not,
    Eq, // == or eq
    Ne, // != or ne
    Lt, // < or lt
    Le, // <= or le
    Ge, // >= or ge
    Gt, // > or gt
    Plus,
    Minus,
    Div, // / or div
    Mod, // % or mod
    Mult,
    True,
    False,
    In,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    If,    // ?
    Elvis, // ?:
    Else,  // :
    Dot,
    Comma,
    Bar,               // |
    FragmentSeparator, // ::

    // `#name`, a utility object reference
    Hash,

    // Only produced when whitespace is significant (literal substitution)
    Whitespace,

    // Template markers, always immediately followed by `{`
    VariableTemplate,  // ${
    SelectionTemplate, // *{
    MessageTemplate,   // #{
    LinkTemplate,      // @{
    FragmentTemplate,  // ~{

    // Special
    Eof,
    Error,
}

/// A token produced by the lexer
///
/// `value` holds the source text of the token, except for string literals where it holds the
/// content between the quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, position: usize) -> Self {
        Self {
            token_type,
            value: value.into(),
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenType::Eof, "", position)
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }

    /// Integer payload of an `Integer` token
    pub fn as_integer(&self) -> Option<i64> {
        match self.token_type {
            TokenType::Integer => self.value.parse().ok(),
            _ => None,
        }
    }

    /// Float payload of a `Float` token; a trailing dot (`1.`) is accepted
    pub fn as_float(&self) -> Option<f64> {
        match self.token_type {
            TokenType::Float => self.value.trim_end_matches('.').parse().ok(),
            _ => None,
        }
    }
}

/// Reserved words recognised in identifier position
pub fn reserved_word(name: &str) -> Option<TokenType> {
    let token_type = match name {
        "div" => TokenType::Div,
        "mod" => TokenType::Mod,
        "and" => TokenType::And,
        "or" => TokenType::Or,
        "not" => TokenType::Not,
        "lt" => TokenType::Lt,
        "le" => TokenType::Le,
        "ge" => TokenType::Ge,
        "gt" => TokenType::Gt,
        "ne" => TokenType::Ne,
        "eq" => TokenType::Eq,
        "true" => TokenType::True,
        "false" => TokenType::False,
        "in" => TokenType::In,
        _ => return None,
    };
    Some(token_type)
}
