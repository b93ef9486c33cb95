//! Expression lexer
//!
//! A state machine over the UTF-8 bytes of an expression. Multi-character tokens are
//! recognised by reading one character too many and then retracting exactly one decoded code
//! point. Whitespace is dropped unless the parser asks for it (literal substitution).

use crate::token::{reserved_word, Token, TokenType};

/// End of input is reported as this character
const EOF_CHAR: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Equals,
    ExclamationMark,
    LessThan,
    GreaterThan,
    Question,
    Number,
    NumberFraction,
    Name,
    Literal,
    Colon,
    Hash,
    TemplateStart,
}

fn is_name_start_char(c: char) -> bool {
    let uc = c as u32;
    c == ':'
        || c.is_ascii_alphabetic()
        || c == '_'
        || (0x0C0..=0x0D6).contains(&uc)
        || (0x0D8..=0x0F6).contains(&uc)
        || (0x0F8..=0x02FF).contains(&uc)
        || (0x0370..=0x037D).contains(&uc)
        || (0x037F..=0x01FFF).contains(&uc)
        || (0x0200C..=0x0200D).contains(&uc)
        || (0x02070..=0x0218F).contains(&uc)
        || (0x02C00..=0x02FEF).contains(&uc)
        || (0x03001..=0x0D7FF).contains(&uc)
        || (0x0F900..=0x0FDCF).contains(&uc)
        || (0x0FDF0..=0x0FFFD).contains(&uc)
        || (0x010000..=0x0EFFFF).contains(&uc)
}

fn is_name_char(c: char) -> bool {
    let uc = c as u32;
    c == '-'
        || c == '.'
        || c.is_ascii_digit()
        || uc == 0x0B7
        || is_name_start_char(c)
        || (0x00300..=0x0036F).contains(&uc)
        || (0x0203F..=0x02040).contains(&uc)
}

/// The expression lexer
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    /// Byte width of the last character read, zero at end of input
    last_width: usize,
    lexeme: String,
    return_whitespace: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
            last_width: 0,
            lexeme: String::new(),
            return_whitespace: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn return_whitespace(&self) -> bool {
        self.return_whitespace
    }

    /// Make whitespace significant; affects the next token read
    pub fn set_return_whitespace(&mut self, value: bool) {
        self.return_whitespace = value;
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.input.get(self.position).copied();
        if byte.is_some() {
            self.position += 1;
        }
        byte
    }

    /// Decode the next code point
    fn next_char(&mut self) -> char {
        let start = self.position;

        let Some(lead) = self.next_byte() else {
            self.last_width = 0;
            return EOF_CHAR;
        };

        let (width, initial) = match lead {
            b if b & 0x80 == 0 => (1, u32::from(b)),
            b if b & 0xE0 == 0xC0 => (2, u32::from(b & 0x1F)),
            b if b & 0xF0 == 0xE0 => (3, u32::from(b & 0x0F)),
            b if b & 0xF8 == 0xF0 => (4, u32::from(b & 0x07)),
            _ => (1, u32::from(char::REPLACEMENT_CHARACTER)),
        };

        let mut code_point = initial;
        for _ in 1..width {
            match self.next_byte() {
                Some(b) if b & 0xC0 == 0x80 => code_point = (code_point << 6) | u32::from(b & 0x3F),
                _ => {
                    code_point = u32::from(char::REPLACEMENT_CHARACTER);
                    break;
                }
            }
        }

        self.last_width = self.position - start;
        let c = char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER);
        self.lexeme.push(c);
        c
    }

    /// Push back the last character read; a no-op at end of input
    fn retract(&mut self) {
        if self.last_width > 0 {
            self.position -= self.last_width;
            self.last_width = 0;
            self.lexeme.pop();
        }
    }

    /// Read the next token
    pub fn next_token(&mut self) -> Token {
        let mut state = State::Start;
        let mut start = self.position;
        self.lexeme.clear();

        loop {
            let ch = self.next_char();

            let token_type = match state {
                State::Start => match ch {
                    EOF_CHAR => Some(TokenType::Eof),
                    '(' => Some(TokenType::LParen),
                    ')' => Some(TokenType::RParen),
                    '[' => Some(TokenType::LBracket),
                    ']' => Some(TokenType::RBracket),
                    '{' => Some(TokenType::LBrace),
                    '}' => Some(TokenType::RBrace),
                    '/' => Some(TokenType::Div),
                    '%' => Some(TokenType::Mod),
                    '+' => Some(TokenType::Plus),
                    '-' => Some(TokenType::Minus),
                    '.' => Some(TokenType::Dot),
                    ',' => Some(TokenType::Comma),
                    '|' => Some(TokenType::Bar),
                    '?' => {
                        state = State::Question;
                        None
                    }
                    '=' => {
                        state = State::Equals;
                        None
                    }
                    '!' => {
                        state = State::ExclamationMark;
                        None
                    }
                    '<' => {
                        state = State::LessThan;
                        None
                    }
                    '>' => {
                        state = State::GreaterThan;
                        None
                    }
                    ':' => {
                        state = State::Colon;
                        None
                    }
                    '*' | '$' | '#' | '@' | '~' => {
                        state = State::TemplateStart;
                        None
                    }
                    ' ' | '\n' | '\r' | '\t' => {
                        if self.return_whitespace {
                            Some(TokenType::Whitespace)
                        } else {
                            self.lexeme.clear();
                            start = self.position;
                            None
                        }
                    }
                    '\'' => {
                        state = State::Literal;
                        None
                    }
                    c if c.is_ascii_digit() => {
                        state = State::Number;
                        None
                    }
                    c if is_name_start_char(c) => {
                        state = State::Name;
                        None
                    }
                    _ => Some(TokenType::Error),
                },

                State::TemplateStart => {
                    let marker = self.lexeme.chars().next().unwrap_or(EOF_CHAR);
                    if ch == '{' {
                        match marker {
                            '$' => Some(TokenType::VariableTemplate),
                            '*' => Some(TokenType::SelectionTemplate),
                            '#' => Some(TokenType::MessageTemplate),
                            '@' => Some(TokenType::LinkTemplate),
                            _ => Some(TokenType::FragmentTemplate),
                        }
                    } else {
                        self.retract();
                        match marker {
                            '*' => Some(TokenType::Mult),
                            '#' => {
                                state = State::Hash;
                                None
                            }
                            _ => Some(TokenType::Error),
                        }
                    }
                }

                State::Equals => {
                    if ch == '=' {
                        Some(TokenType::Eq)
                    } else {
                        self.retract();
                        Some(TokenType::Assign)
                    }
                }

                State::Question => {
                    if ch == ':' {
                        Some(TokenType::Elvis)
                    } else {
                        self.retract();
                        Some(TokenType::If)
                    }
                }

                State::ExclamationMark => {
                    if ch == '=' {
                        Some(TokenType::Ne)
                    } else {
                        self.retract();
                        Some(TokenType::Error)
                    }
                }

                State::LessThan => {
                    if ch == '=' {
                        Some(TokenType::Le)
                    } else {
                        self.retract();
                        Some(TokenType::Lt)
                    }
                }

                State::GreaterThan => {
                    if ch == '=' {
                        Some(TokenType::Ge)
                    } else {
                        self.retract();
                        Some(TokenType::Gt)
                    }
                }

                State::Number => {
                    if ch.is_ascii_digit() {
                        None
                    } else if ch == '.' {
                        state = State::NumberFraction;
                        None
                    } else {
                        self.retract();
                        Some(TokenType::Integer)
                    }
                }

                State::NumberFraction => {
                    if ch.is_ascii_digit() {
                        None
                    } else {
                        self.retract();
                        Some(TokenType::Float)
                    }
                }

                State::Name => {
                    if ch == '.' || ch == ':' || !is_name_char(ch) {
                        self.retract();
                        Some(reserved_word(&self.lexeme).unwrap_or(TokenType::Identifier))
                    } else {
                        None
                    }
                }

                State::Literal => match ch {
                    EOF_CHAR => Some(TokenType::Error),
                    '\'' => {
                        let content = self.lexeme[1..self.lexeme.len() - 1].to_string();
                        self.lexeme = content;
                        Some(TokenType::String)
                    }
                    _ => None,
                },

                State::Hash => {
                    if ch == '.' || !is_name_char(ch) {
                        self.retract();
                        Some(TokenType::Hash)
                    } else {
                        None
                    }
                }

                State::Colon => {
                    if ch == ':' {
                        Some(TokenType::FragmentSeparator)
                    } else {
                        self.retract();
                        Some(TokenType::Else)
                    }
                }
            };

            if let Some(token_type) = token_type {
                return Token::new(token_type, self.lexeme.as_str(), start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retract_pushes_back_one_multibyte_char() {
        let mut lexer = Lexer::new("a€");
        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Identifier);
        assert_eq!(token.value, "a€");

        let mut lexer = Lexer::new("<€");
        assert_eq!(lexer.next_token().token_type, TokenType::Lt);
        assert_eq!(lexer.position(), 1);
    }

    #[test]
    fn whitespace_is_significant_on_request() {
        let mut lexer = Lexer::new("a b");
        lexer.set_return_whitespace(true);
        assert_eq!(lexer.next_token().token_type, TokenType::Identifier);
        assert_eq!(lexer.next_token().token_type, TokenType::Whitespace);
        assert_eq!(lexer.next_token().token_type, TokenType::Identifier);
        assert_eq!(lexer.next_token().token_type, TokenType::Eof);
    }
}
