//! Expression interpreter
//!
//! A recursive descent parser that evaluates while it parses; there is no intermediate AST.
//! Precedence (lowest to highest):
//! 1. conditional (`? :`) and elvis (`?:`)
//! 2. `or`
//! 3. `and`
//! 4. equality (`==`, `!=`)
//! 5. relational (`<`, `<=`, `>=`, `>`, `in`, `not in`)
//! 6. additive (`+`, `-`)
//! 7. multiplicative (`*`, `/`, `%`)
//! 8. unary (`-`, `not`)
//! 9. primary (literals, templates, utility calls, paths)
//!
//! Operands that are not going to be used (the untaken branch of a conditional, the right
//! side of a decided `and`/`or`) are still parsed, but with evaluation suppressed: utility
//! methods are not called and evaluation errors are swallowed.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::fragment::{Axis, FragmentSpec, NodeTest, Predicate, Selector, Step};
use crate::lexer::Lexer;
use crate::scope::Scope;
use crate::token::{reserved_word, Token, TokenType};
use crate::utility;
use crate::value::Value;

/// Deepest expression nesting accepted; must fit a 2 MiB thread stack in debug builds
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Evaluate `expr`, rendering failures as an error string.
///
/// Only contract violations (a scope chain without a request) are returned as errors.
pub fn evaluate(scope: &Scope<'_>, expr: &str) -> Result<Value> {
    fail_soft(try_evaluate(scope, expr))
}

/// Evaluate `expr`, reporting every failure
pub fn try_evaluate(scope: &Scope<'_>, expr: &str) -> Result<Value> {
    let mut interpreter = Interpreter::new(scope, expr);
    let result = if interpreter.current_token_is(TokenType::Eof) {
        Value::Null
    } else {
        interpreter.parse_expr()?
    };
    interpreter.expect(TokenType::Eof)?;
    Ok(result)
}

/// Evaluate the value of an `insert`, `replace` or `include` attribute, rendering failures
/// as an error string. Bare `template :: selector` forms are accepted without `~{}`.
pub fn evaluate_link(scope: &Scope<'_>, expr: &str) -> Result<Value> {
    fail_soft(try_evaluate_link(scope, expr))
}

pub fn try_evaluate_link(scope: &Scope<'_>, expr: &str) -> Result<Value> {
    let mut interpreter = Interpreter::new(scope, expr);
    let result = interpreter.parse_link_attribute()?;
    interpreter.expect(TokenType::Eof)?;
    Ok(result)
}

/// Replace `text` with the text of the expression it holds. On failure `text` is left
/// untouched and `false` is returned.
pub fn process(scope: &Scope<'_>, text: &mut String) -> Result<bool> {
    match try_evaluate(scope, text) {
        Ok(value) => {
            *text = value.to_text();
            Ok(true)
        }
        Err(e) if e.is_contract_violation() => Err(e),
        Err(e) => {
            tracing::debug!(expr = %text, error = %e, "expression failed");
            Ok(false)
        }
    }
}

/// Evaluate a comma separated list of `name=expr` pairs
pub fn evaluate_attr(scope: &Scope<'_>, expr: &str) -> Result<Vec<(String, String)>> {
    let mut interpreter = Interpreter::new(scope, expr);
    let mut result = Vec::new();

    loop {
        let name = interpreter.parse_qualified_name()?;
        interpreter.expect(TokenType::Assign)?;
        let value = interpreter.parse_expr()?;
        result.push((name, value.to_text()));

        if !interpreter.current_token_is(TokenType::Comma) {
            break;
        }
        interpreter.advance();
    }

    interpreter.expect(TokenType::Eof)?;
    Ok(result)
}

/// True when every expression in a comma separated list is truthy
pub fn evaluate_assert(scope: &Scope<'_>, expr: &str) -> Result<bool> {
    let mut interpreter = Interpreter::new(scope, expr);

    loop {
        if !interpreter.parse_expr()?.is_truthy() {
            return Ok(false);
        }
        if !interpreter.current_token_is(TokenType::Comma) {
            break;
        }
        interpreter.advance();
    }

    interpreter.expect(TokenType::Eof)?;
    Ok(true)
}

/// Evaluate `name=expr` bindings; each expression sees the names bound before it
pub fn evaluate_with(scope: &Scope<'_>, expr: &str) -> Result<Vec<(String, Value)>> {
    let mut interpreter = Interpreter::new(scope, expr);

    while interpreter.current_token_is(TokenType::Identifier) {
        let name = interpreter.current_token.value.clone();
        interpreter.advance();
        interpreter.expect(TokenType::Assign)?;

        let value = interpreter.parse_expr()?;
        interpreter.locals.push((name, value));

        if !interpreter.current_token_is(TokenType::Comma) {
            break;
        }
        interpreter.advance();
    }

    interpreter.expect(TokenType::Eof)?;
    Ok(interpreter.locals)
}

fn fail_soft(result: Result<Value>) -> Result<Value> {
    match result {
        Err(e) if !e.is_contract_violation() => {
            Ok(Value::from(format!("Error parsing expression: {e}")))
        }
        other => other,
    }
}

fn has_scheme(uri: &str) -> bool {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("uri scheme regex must compile")
        })
        .is_match(uri)
}

/// Parser and evaluator over a single expression string
pub struct Interpreter<'i, 's> {
    scope: &'s Scope<'s>,
    lexer: Lexer<'i>,
    current_token: Token,
    /// Non-zero while parsing an operand whose value is discarded
    skip_depth: usize,
    /// Inside `*{...}`: names resolve against selected objects too
    selecting: bool,
    recursion_depth: usize,
    /// Bindings made earlier in the same `with` list
    locals: Vec<(String, Value)>,
}

impl<'i, 's> Interpreter<'i, 's> {
    pub fn new(scope: &'s Scope<'s>, input: &'i str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Self {
            scope,
            lexer,
            current_token,
            skip_depth: 0,
            selecting: false,
            recursion_depth: 0,
            locals: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Token handling

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token.is(token_type)
    }

    fn current_token_is_one_of(&self, types: &[TokenType]) -> bool {
        types.contains(&self.current_token.token_type)
    }

    /// Expect a specific token type and advance
    fn expect(&mut self, token_type: TokenType) -> Result<Token> {
        if self.current_token.is(token_type) {
            let token = self.current_token.clone();
            self.advance();
            return Ok(token);
        }

        if self.current_token_is_one_of(&[TokenType::Error, TokenType::Eof]) {
            return Err(self.syntax_error());
        }

        Err(Error::ParseError(format!(
            "expected {:?}, found '{}' at position {}",
            token_type, self.current_token.value, self.current_token.position
        )))
    }

    fn syntax_error(&self) -> Error {
        let token = &self.current_token;
        let message = match token.token_type {
            TokenType::Error if token.value.starts_with('\'') => String::from("run-away string"),
            TokenType::Error => format!(
                "unexpected character '{}' at position {}",
                token.value, token.position
            ),
            TokenType::Eof => String::from("unexpected end of expression"),
            _ => format!(
                "unexpected token '{}' at position {}",
                token.value, token.position
            ),
        };
        Error::ParseError(message)
    }

    /// A name; reserved words are accepted where only a name can appear
    fn expect_name(&mut self) -> Result<String> {
        let token = &self.current_token;
        if token.is(TokenType::Identifier) || reserved_word(&token.value).is_some() {
            let name = token.value.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.syntax_error())
        }
    }

    /// A name optionally preceded by a namespace prefix, `p:name`
    fn parse_qualified_name(&mut self) -> Result<String> {
        let mut name = self.expect_name()?;
        if self.current_token_is(TokenType::Else) {
            self.advance();
            name.push(':');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(Error::ParseError(format!(
                "Expression too deeply nested (max depth: {})",
                MAX_RECURSION_DEPTH
            )));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    // ------------------------------------------------------------------
    // Evaluation helpers

    fn skipping(&self) -> bool {
        self.skip_depth > 0
    }

    /// Discard evaluation errors of operands that do not count
    fn guard(&self, result: Result<Value>) -> Result<Value> {
        if self.skipping() {
            Ok(result.unwrap_or_default())
        } else {
            result
        }
    }

    /// Parse an expression, evaluating it only when `taken`
    fn parse_branch(&mut self, taken: bool) -> Result<Value> {
        if !taken {
            self.skip_depth += 1;
        }
        let result = self.parse_expr();
        if !taken {
            self.skip_depth -= 1;
        }
        result
    }

    fn lookup(&self, name: &str) -> Value {
        if let Some((_, value)) = self.locals.iter().rev().find(|(n, _)| n == name) {
            return value.clone();
        }
        self.scope.lookup(name, self.selecting)
    }

    // ------------------------------------------------------------------
    // Grammar

    fn parse_expr(&mut self) -> Result<Value> {
        self.check_recursion_depth()?;
        let result = self.parse_conditional_expr();
        self.decrement_recursion_depth();
        result
    }

    fn parse_conditional_expr(&mut self) -> Result<Value> {
        let result = self.parse_or_expr()?;

        if self.current_token_is(TokenType::If) {
            self.advance();
            let condition = result.is_truthy();
            let then_value = self.parse_branch(condition)?;

            if self.current_token_is(TokenType::Else) {
                self.advance();
                let else_value = self.parse_branch(!condition)?;
                return Ok(if condition { then_value } else { else_value });
            }

            return Ok(if condition { then_value } else { Value::Null });
        }

        if self.current_token_is(TokenType::Elvis) {
            self.advance();
            let keep = result.is_truthy();
            let fallback = self.parse_branch(!keep)?;
            return Ok(if keep { result } else { fallback });
        }

        Ok(result)
    }

    fn parse_or_expr(&mut self) -> Result<Value> {
        let mut result = self.parse_and_expr()?;
        while self.current_token_is(TokenType::Or) {
            self.advance();
            let decided = result.is_truthy();
            if decided {
                self.skip_depth += 1;
            }
            let rhs = self.parse_and_expr();
            if decided {
                self.skip_depth -= 1;
            }
            result = Value::Boolean(decided || rhs?.is_truthy());
        }
        Ok(result)
    }

    fn parse_and_expr(&mut self) -> Result<Value> {
        let mut result = self.parse_equality_expr()?;
        while self.current_token_is(TokenType::And) {
            self.advance();
            let decided = !result.is_truthy();
            if decided {
                self.skip_depth += 1;
            }
            let rhs = self.parse_equality_expr();
            if decided {
                self.skip_depth -= 1;
            }
            result = Value::Boolean(!decided && rhs?.is_truthy());
        }
        Ok(result)
    }

    fn parse_equality_expr(&mut self) -> Result<Value> {
        let result = self.parse_relational_expr()?;
        match self.current_token.token_type {
            TokenType::Eq => {
                self.advance();
                let rhs = self.parse_relational_expr()?;
                Ok(Value::Boolean(result == rhs))
            }
            TokenType::Ne => {
                self.advance();
                let rhs = self.parse_relational_expr()?;
                Ok(Value::Boolean(result != rhs))
            }
            _ => Ok(result),
        }
    }

    fn parse_relational_expr(&mut self) -> Result<Value> {
        let result = self.parse_additive_expr()?;
        let token_type = self.current_token.token_type;

        match token_type {
            TokenType::Lt | TokenType::Le | TokenType::Ge | TokenType::Gt => {
                self.advance();
                let rhs = self.parse_additive_expr()?;
                let ordering = result.compare(&rhs).map(|ordering| {
                    Value::Boolean(match token_type {
                        TokenType::Lt => ordering.is_lt(),
                        TokenType::Le => ordering.is_le(),
                        TokenType::Ge => ordering.is_ge(),
                        _ => ordering.is_gt(),
                    })
                });
                self.guard(ordering)
            }
            TokenType::In => {
                self.advance();
                let collection = self.parse_additive_expr()?;
                Ok(Value::Boolean(collection.contains(&result)))
            }
            TokenType::Not => {
                self.advance();
                self.expect(TokenType::In)?;
                let collection = self.parse_additive_expr()?;
                Ok(Value::Boolean(!collection.contains(&result)))
            }
            _ => Ok(result),
        }
    }

    fn parse_additive_expr(&mut self) -> Result<Value> {
        let mut result = self.parse_multiplicative_expr()?;
        loop {
            match self.current_token.token_type {
                TokenType::Plus => {
                    self.advance();
                    let rhs = self.parse_multiplicative_expr()?;
                    result = self.guard(result.add(&rhs))?;
                }
                TokenType::Minus => {
                    self.advance();
                    let rhs = self.parse_multiplicative_expr()?;
                    result = self.guard(result.sub(&rhs))?;
                }
                _ => return Ok(result),
            }
        }
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Value> {
        let mut result = self.parse_unary_expr()?;
        loop {
            let token_type = self.current_token.token_type;
            if !matches!(token_type, TokenType::Mult | TokenType::Div | TokenType::Mod) {
                return Ok(result);
            }
            self.advance();
            let rhs = self.parse_unary_expr()?;
            let value = match token_type {
                TokenType::Mult => result.mul(&rhs),
                TokenType::Div => result.div(&rhs),
                _ => result.rem(&rhs),
            };
            result = self.guard(value)?;
        }
    }

    fn parse_unary_expr(&mut self) -> Result<Value> {
        match self.current_token.token_type {
            TokenType::Minus => {
                self.advance();
                let operand = self.parse_primary_expr()?;
                self.guard(operand.neg())
            }
            TokenType::Not => {
                self.advance();
                let operand = self.parse_primary_expr()?;
                Ok(Value::Boolean(!operand.is_truthy()))
            }
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Value> {
        match self.current_token.token_type {
            TokenType::True => {
                self.advance();
                Ok(Value::Boolean(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Value::Boolean(false))
            }
            TokenType::Integer => {
                let token = self.expect(TokenType::Integer)?;
                token.as_integer().map(Value::Integer).ok_or_else(|| {
                    Error::ParseError(format!("invalid integer literal '{}'", token.value))
                })
            }
            TokenType::Float => {
                let token = self.expect(TokenType::Float)?;
                token.as_float().map(Value::Float).ok_or_else(|| {
                    Error::ParseError(format!("invalid number literal '{}'", token.value))
                })
            }
            TokenType::String => {
                let token = self.expect(TokenType::String)?;
                Ok(Value::String(token.value))
            }
            TokenType::LParen => {
                self.advance();
                let result = self.parse_expr()?;
                self.expect(TokenType::RParen)?;
                Ok(result)
            }
            TokenType::Hash => self.parse_utility_expr(),
            TokenType::LBrace => self.parse_list_expr(),
            TokenType::Bar => self.parse_literal_substitution(),
            TokenType::Identifier => {
                let name = self.current_token.value.clone();
                self.advance();
                let value = self.lookup(&name);
                self.parse_path(value)
            }
            TokenType::VariableTemplate
            | TokenType::SelectionTemplate
            | TokenType::LinkTemplate
            | TokenType::MessageTemplate => self.parse_template_expr(),
            TokenType::FragmentTemplate => {
                self.advance();
                let result = self.parse_fragment_expr()?;
                self.expect(TokenType::RBrace)?;
                Ok(result)
            }
            TokenType::Error => Err(self.syntax_error()),
            _ => Err(Error::ParseError(format!(
                "syntax error, expected number, string or object at position {}",
                self.current_token.position
            ))),
        }
    }

    /// `.member` and `[index]` suffixes
    fn parse_path(&mut self, mut result: Value) -> Result<Value> {
        loop {
            match self.current_token.token_type {
                TokenType::Dot => {
                    self.advance();
                    let member = self.expect_name()?;
                    result = result.member(&member);
                }
                TokenType::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenType::RBracket)?;
                    result = result.index(&index);
                }
                _ => return Ok(result),
            }
        }
    }

    /// `{a, b, c}`
    fn parse_list_expr(&mut self) -> Result<Value> {
        self.expect(TokenType::LBrace)?;
        let mut items = Vec::new();

        if !self.current_token_is(TokenType::RBrace) {
            loop {
                items.push(self.parse_expr()?);
                if !self.current_token_is(TokenType::Comma) {
                    break;
                }
                self.advance();
            }
        }

        self.expect(TokenType::RBrace)?;
        Ok(Value::Array(items))
    }

    /// `|text ${expr} more text|`, whitespace is kept verbatim
    fn parse_literal_substitution(&mut self) -> Result<Value> {
        self.lexer.set_return_whitespace(true);
        self.advance();

        let mut result = String::new();

        while !self.current_token_is_one_of(&[TokenType::Bar, TokenType::Eof]) {
            match self.current_token.token_type {
                TokenType::VariableTemplate
                | TokenType::SelectionTemplate
                | TokenType::LinkTemplate
                | TokenType::MessageTemplate => {
                    result.push_str(&self.parse_template_expr()?.to_text());
                }
                TokenType::String => {
                    result.push('\'');
                    result.push_str(&self.current_token.value);
                    result.push('\'');
                    self.advance();
                }
                _ => {
                    result.push_str(&self.current_token.value);
                    self.advance();
                }
            }
        }

        self.lexer.set_return_whitespace(false);
        self.expect(TokenType::Bar)?;

        Ok(Value::String(result))
    }

    /// `${...}`, `*{...}`, `@{...}`
    fn parse_template_expr(&mut self) -> Result<Value> {
        let saved_whitespace = self.lexer.return_whitespace();
        let saved_selecting = self.selecting;
        self.lexer.set_return_whitespace(false);

        let token_type = self.current_token.token_type;
        let result = match token_type {
            TokenType::VariableTemplate => {
                self.advance();
                self.selecting = false;
                self.parse_expr()
            }
            TokenType::SelectionTemplate => {
                self.advance();
                self.selecting = true;
                self.parse_expr()
            }
            TokenType::LinkTemplate => {
                self.advance();
                self.parse_link_template_expr()
            }
            TokenType::MessageTemplate => Err(Error::Unsupported(String::from(
                "message expressions #{...}",
            ))),
            _ => Err(self.syntax_error()),
        };

        self.selecting = saved_selecting;
        self.lexer.set_return_whitespace(saved_whitespace);
        let result = result?;

        self.expect(TokenType::RBrace)?;
        Ok(result)
    }

    /// Body of `@{...}`: a path with embedded expressions and an optional parameter list
    fn parse_link_template_expr(&mut self) -> Result<Value> {
        let mut path = String::new();
        let mut braces = 0usize;

        if self.current_token_is(TokenType::Div) {
            self.advance();

            let context = self.scope.context_name();
            if context.is_empty() {
                path.push('/');
            } else if has_scheme(&context) {
                path = format!("{context}/");
            } else {
                path = format!("/{context}/");
            }
        }

        while !self.current_token_is_one_of(&[TokenType::LParen, TokenType::Eof]) {
            match self.current_token.token_type {
                TokenType::RBrace => {
                    if braces == 0 {
                        break;
                    }
                    braces -= 1;
                    path.push('}');
                    self.advance();
                }
                TokenType::LBrace => {
                    braces += 1;
                    path.push('{');
                    self.advance();
                }
                TokenType::VariableTemplate | TokenType::SelectionTemplate => {
                    path.push_str(&self.parse_template_expr()?.to_text());
                }
                TokenType::Error if self.current_token.value.starts_with('\'') => {
                    return Err(self.syntax_error());
                }
                _ => {
                    path.push_str(&self.current_token.value);
                    self.advance();
                }
            }
        }

        if self.current_token_is(TokenType::LParen) {
            self.advance();

            let mut parameters = BTreeMap::new();

            loop {
                let name = self.expect_name()?;

                if self.current_token_is(TokenType::Assign) {
                    self.advance();
                    let value = self.parse_primary_expr()?.to_text();

                    let placeholder = format!("{{{name}}}");
                    if path.contains(&placeholder) {
                        path = path.replace(&placeholder, &value);
                    } else {
                        parameters.insert(name, value);
                    }
                } else {
                    parameters.insert(name, String::new());
                }

                if !self.current_token_is(TokenType::Comma) {
                    break;
                }
                self.advance();
            }

            self.expect(TokenType::RParen)?;

            if !parameters.is_empty() {
                let query: Vec<String> = parameters
                    .iter()
                    .map(|(name, value)| {
                        if value.is_empty() {
                            urlencoding::encode(name).into_owned()
                        } else {
                            format!(
                                "{}={}",
                                urlencoding::encode(name),
                                urlencoding::encode(value)
                            )
                        }
                    })
                    .collect();
                path.push('?');
                path.push_str(&query.join("&"));
            }
        }

        Ok(Value::String(path))
    }

    /// Value of an `insert`/`replace`/`include` attribute
    fn parse_link_attribute(&mut self) -> Result<Value> {
        match self.current_token.token_type {
            TokenType::Identifier | TokenType::FragmentSeparator => self.parse_fragment_expr(),
            TokenType::LinkTemplate => {
                self.advance();
                let result = self.parse_fragment_expr()?;
                self.expect(TokenType::RBrace)?;
                Ok(result)
            }
            TokenType::Hash => {
                let selector = self.parse_selector()?;
                Ok(FragmentSpec::new("this", selector).to_value())
            }
            _ => self.parse_primary_expr(),
        }
    }

    /// Body of `~{...}`: `[template] :: selector`
    fn parse_fragment_expr(&mut self) -> Result<Value> {
        let template = match self.current_token.token_type {
            TokenType::FragmentSeparator => String::from("this"),
            TokenType::Identifier => {
                let name = self.current_token.value.clone();
                self.advance();
                name
            }
            TokenType::RBrace => {
                return Ok(FragmentSpec::new("this", Selector::default()).to_value());
            }
            _ => self.parse_expr()?.to_text(),
        };

        let selector = if self.current_token_is(TokenType::FragmentSeparator) {
            self.advance();
            self.parse_selector()?
        } else {
            Selector::default()
        };

        Ok(FragmentSpec::new(template, selector).to_value())
    }

    fn parse_selector(&mut self) -> Result<Selector> {
        let mut selector = Selector::default();

        while self.current_token_is_one_of(&[
            TokenType::Div,
            TokenType::Identifier,
            TokenType::LBracket,
            TokenType::Dot,
            TokenType::Hash,
        ]) {
            let mut divided = false;
            let axis = if self.current_token_is(TokenType::Div) {
                divided = true;
                self.advance();
                if self.current_token_is(TokenType::Div) {
                    self.advance();
                    Axis::Descendant
                } else {
                    Axis::Child
                }
            } else {
                Axis::Descendant
            };

            let test = if self.current_token_is(TokenType::Identifier) {
                let name = self.parse_qualified_name()?;

                let node_test = match name.as_str() {
                    "text" => Some(NodeTest::Text),
                    "comment" => Some(NodeTest::Comment),
                    "node" => Some(NodeTest::Node),
                    _ => None,
                };

                match node_test {
                    Some(test) if self.current_token_is(TokenType::LParen) => {
                        self.advance();
                        self.expect(TokenType::RParen)?;
                        test
                    }
                    _ => {
                        if self.current_token_is(TokenType::LParen) {
                            self.advance();
                            while !self.current_token_is_one_of(&[
                                TokenType::RParen,
                                TokenType::Eof,
                            ]) {
                                selector.params.push(self.parse_expr()?);
                                if !self.current_token_is(TokenType::Comma) {
                                    break;
                                }
                                self.advance();
                            }
                            self.expect(TokenType::RParen)?;
                        }

                        if divided {
                            NodeTest::Name(name)
                        } else {
                            NodeTest::Fragment(name)
                        }
                    }
                }
            } else {
                NodeTest::AnyElement
            };

            let mut step = Step::new(axis, test);

            loop {
                match self.current_token.token_type {
                    TokenType::LBracket => {
                        self.advance();
                        step.predicates.push(self.parse_predicate()?);
                        self.expect(TokenType::RBracket)?;
                    }
                    TokenType::Dot => {
                        self.advance();
                        let name = self.expect_name()?;
                        step.predicates.push(Predicate::Class { name });
                    }
                    TokenType::Hash => {
                        let id = self.current_token.value[1..].to_string();
                        self.advance();
                        selector.by_id = true;
                        step.predicates.push(Predicate::AttributeEquals {
                            name: String::from("id"),
                            value: id,
                        });
                    }
                    _ => break,
                }
            }

            selector.steps.push(step);
        }

        Ok(selector)
    }

    /// Inside `[...]`: `@name`, `@name='value'` or a position
    fn parse_predicate(&mut self) -> Result<Predicate> {
        match self.current_token.token_type {
            TokenType::Integer => {
                let token = self.expect(TokenType::Integer)?;
                let index = token
                    .value
                    .parse()
                    .map_err(|_| Error::ParseError(format!("invalid position '{}'", token.value)))?;
                Ok(Predicate::Position { index })
            }
            TokenType::Error if self.current_token.value == "@" => {
                self.advance();
                let name = self.parse_qualified_name()?;

                if !self.current_token_is_one_of(&[TokenType::Assign, TokenType::Eq]) {
                    return Ok(Predicate::AttributeExists { name });
                }
                self.advance();

                let value = match self.current_token.token_type {
                    TokenType::String | TokenType::Integer | TokenType::Identifier => {
                        let value = self.current_token.value.clone();
                        self.advance();
                        value
                    }
                    _ => return Err(self.syntax_error()),
                };
                Ok(Predicate::AttributeEquals { name, value })
            }
            _ => Err(Error::ParseError(format!(
                "unsupported selector predicate at position {}",
                self.current_token.position
            ))),
        }
    }

    /// `#object.method(args)`
    fn parse_utility_expr(&mut self) -> Result<Value> {
        let token = self.expect(TokenType::Hash)?;
        let object = token.value.trim_start_matches('#').to_string();
        self.expect(TokenType::Dot)?;
        let method = self.expect_name()?;

        let mut params = Vec::new();
        if self.current_token_is(TokenType::LParen) {
            self.advance();
            while !self.current_token_is_one_of(&[TokenType::RParen, TokenType::Eof]) {
                params.push(self.parse_expr()?);
                if !self.current_token_is(TokenType::Comma) {
                    break;
                }
                self.advance();
            }
            self.expect(TokenType::RParen)?;
        }

        if self.skipping() {
            return Ok(Value::Null);
        }

        utility::call(self.scope, &object, &method, &params)
    }
}
