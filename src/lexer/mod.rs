//! Lexer (tokenizer) for Excellent expressions.
//!
//! Converts the text of one `@(...)` expression or `@identifier` into a stream
//! of [`token::Token`]s for the parser. The template scanner has already
//! removed the surrounding `@(` and `)`.

pub mod token;

use crate::errors::SyntaxError;
use token::{SourceLocation, Token, TokenKind};

/// Lexer for Excellent expressions
pub struct Lexer<'a> {
    /// Source code being lexed
    source: &'a str,
    /// Characters with their byte offsets
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    /// Current position in bytes
    position: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start position of current token
    token_start: usize,
    /// Start line of current token
    token_start_line: usize,
    /// Start column of current token
    token_start_column: usize,
    /// Whether the previous token was a `.`, in which case numbers are integer keys
    after_dot: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given expression
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            after_dot: false,
        }
    }

    /// Get the source code
    pub fn source(&self) -> &str {
        self.source
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            self.after_dot = token.kind == TokenKind::Dot;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        self.token_start = self.position;
        self.token_start_line = self.line;
        self.token_start_column = self.column;

        let Some(ch) = self.peek_char() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        match ch {
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_name()),
            '0'..='9' => Ok(self.lex_number()),
            '"' => self.lex_text(),
            '(' => Ok(self.single(TokenKind::LeftParen)),
            ')' => Ok(self.single(TokenKind::RightParen)),
            '[' => Ok(self.single(TokenKind::LeftBracket)),
            ']' => Ok(self.single(TokenKind::RightBracket)),
            ',' => Ok(self.single(TokenKind::Comma)),
            '.' => Ok(self.single(TokenKind::Dot)),
            '+' => Ok(self.single(TokenKind::Plus)),
            '-' => Ok(self.single(TokenKind::Minus)),
            '*' => Ok(self.single(TokenKind::Star)),
            '/' => Ok(self.single(TokenKind::Slash)),
            '^' => Ok(self.single(TokenKind::Caret)),
            '&' => Ok(self.single(TokenKind::Ampersand)),
            '=' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    Ok(self.make_token(TokenKind::Arrow))
                } else {
                    Ok(self.make_token(TokenKind::Eq))
                }
            }
            '!' => {
                if self.peek_char_at(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(self.make_token(TokenKind::NotEq))
                } else {
                    Err(self.error_unexpected_char(ch))
                }
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(self.make_token(TokenKind::LtEq))
                } else {
                    Ok(self.make_token(TokenKind::Lt))
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(self.make_token(TokenKind::GtEq))
                } else {
                    Ok(self.make_token(TokenKind::Gt))
                }
            }
            _ => Err(self.error_unexpected_char(ch)),
        }
    }

    /// Peek at the current character without consuming
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Peek at a character at offset from current position
    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.source[self.position..].chars().nth(offset)
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.position = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.advance();
        self.make_token(kind)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Lex a name or reserved word
    fn lex_name(&mut self) -> Token {
        let start = self.position;

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.position];
        let kind = if self.after_dot {
            TokenKind::Name(text.to_string())
        } else {
            TokenKind::reserved_from_str(text).unwrap_or_else(|| TokenKind::Name(text.to_string()))
        };

        self.make_token(kind)
    }

    /// Lex a decimal number, or an integer key directly after a `.`
    fn lex_number(&mut self) -> Token {
        let start = self.position;

        self.consume_digits();

        if !self.after_dot && self.peek_char() == Some('.') {
            if let Some(next) = self.peek_char_at(1) {
                if next.is_ascii_digit() {
                    self.advance(); // .
                    self.consume_digits();
                }
            }
        }

        let text = &self.source[start..self.position];
        self.make_token(TokenKind::Number(text.to_string()))
    }

    fn consume_digits(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Lex a double-quoted text literal, decoding escapes
    fn lex_text(&mut self) -> Result<Token, SyntaxError> {
        self.advance(); // opening "

        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(SyntaxError::at(
                        self.source,
                        &self.token_location(),
                        "add a closing quote to the text",
                    ));
                }
                Some('"') => break,
                Some('\\') => self.lex_escape_sequence(&mut value),
                Some(ch) => value.push(ch),
            }
        }

        Ok(self.make_token(TokenKind::Text(value)))
    }

    /// Decode one escape sequence after a backslash. Unknown escapes are kept as written.
    fn lex_escape_sequence(&mut self, value: &mut String) {
        match self.peek_char() {
            Some('n') => {
                self.advance();
                value.push('\n');
            }
            Some('r') => {
                self.advance();
                value.push('\r');
            }
            Some('t') => {
                self.advance();
                value.push('\t');
            }
            Some('\\') => {
                self.advance();
                value.push('\\');
            }
            Some('"') => {
                self.advance();
                value.push('"');
            }
            Some(marker @ ('u' | 'U')) => {
                let width = if marker == 'u' { 4 } else { 8 };
                let hex: String = self.source[self.position..]
                    .chars()
                    .skip(1)
                    .take(width)
                    .collect();

                let decoded = if hex.len() == width && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };

                match decoded {
                    Some(c) => {
                        for _ in 0..=width {
                            self.advance();
                        }
                        value.push(c);
                    }
                    None => value.push('\\'),
                }
            }
            _ => value.push('\\'),
        }
    }

    /// Create a token with the current token span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.token_location())
    }

    /// Get the location for the current token
    fn token_location(&self) -> SourceLocation {
        SourceLocation::new(
            self.token_start_line,
            self.token_start_column,
            self.token_start,
            self.position - self.token_start,
        )
    }

    /// Get the current location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position, 1)
    }

    /// Create an unexpected character error
    fn error_unexpected_char(&self, ch: char) -> SyntaxError {
        SyntaxError::at(
            self.source,
            &self.current_location(),
            format!("'{}' is not valid in an expression", ch),
        )
    }
}
