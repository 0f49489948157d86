//! Criteria string tokenizer.
//!
//! Tokens are commas (phrase separators), bare words, and quoted strings
//! (single or double quotes). Bare words end at whitespace or a comma; both
//! forms honor backslash escapes: `\0 \b \f \n \r \t`, hex escapes `\xNN`
//! `\uNNNN` `\UNNNNNN`, and any other escaped character stands for itself
//! (so `\ ` keeps a space inside a bare word and `\'` a quote inside a
//! quoted one). An unterminated quoted string or a truncated escape is an
//! error.

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// A word or quoted string
    String,
    /// The phrase separator
    Comma,
    /// End of input
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Token value after escape processing (empty for commas and end)
    pub value: String,
    /// Raw source text of the token
    pub text: String,
    /// Character offset of the token in the source
    pub position: usize,
}

impl Token {
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::String
    }
}

pub(crate) struct Lexer {
    chars: Vec<char>,
    pos: usize,
    start: usize,
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            start: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_whitespace() {
                self.pos += 1;
                continue;
            }

            self.start = self.pos;
            if ch == ',' {
                self.pos += 1;
                return Ok(self.token(TokenKind::Comma, String::new()));
            }
            if ch == '\'' || ch == '"' {
                return self.quoted_string();
            }
            return self.bare_string();
        }

        Ok(Token {
            kind: TokenKind::End,
            value: String::new(),
            text: String::new(),
            position: self.pos,
        })
    }

    fn token(&self, kind: TokenKind, value: String) -> Token {
        Token {
            kind,
            value,
            text: self.chars[self.start..self.pos].iter().collect(),
            position: self.start,
        }
    }

    fn bare_string(&mut self) -> Result<Token, ParseError> {
        let mut value = String::new();
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_whitespace() || ch == ',' {
                break;
            }
            self.pos += 1;
            if ch == '\\' {
                value.push(self.escape_char()?);
            } else {
                value.push(ch);
            }
        }
        Ok(self.token(TokenKind::String, value))
    }

    fn quoted_string(&mut self) -> Result<Token, ParseError> {
        let quote = self.chars[self.pos];
        self.pos += 1;
        let mut value = String::new();
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            self.pos += 1;
            if ch == quote {
                return Ok(self.token(TokenKind::String, value));
            }
            if ch == '\\' {
                value.push(self.escape_char()?);
            } else {
                value.push(ch);
            }
        }
        Err(ParseError::span(
            "Unterminated quoted string",
            self.start,
            self.chars.len() - self.start,
        ))
    }

    fn escape_char(&mut self) -> Result<char, ParseError> {
        let start = self.pos;
        if self.pos >= self.chars.len() {
            return Err(ParseError::span(
                "Incomplete escape",
                start,
                self.chars.len().saturating_sub(start).max(1),
            ));
        }

        let ch = self.chars[self.pos];
        self.pos += 1;
        match ch {
            'x' => self.hex_escape(2),
            'u' => self.hex_escape(4),
            'U' => self.hex_escape(6),
            _ => Ok(translate_escape(ch)),
        }
    }

    fn hex_escape(&mut self, digit_count: usize) -> Result<char, ParseError> {
        let start = self.pos;
        if self.pos + digit_count > self.chars.len() {
            return Err(ParseError::span(
                "Incomplete escape",
                start,
                self.chars.len() - start.min(self.chars.len()),
            ));
        }

        let text: String = self.chars[self.pos..self.pos + digit_count].iter().collect();
        self.pos += digit_count;

        u32::from_str_radix(&text, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::span("Invalid hex escape", start, digit_count))
    }
}

fn translate_escape(ch: char) -> char {
    match ch {
        '0' => '\0',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}
