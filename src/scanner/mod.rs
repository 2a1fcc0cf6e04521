//! Template scanner
//!
//! Splits template text into literal body text, `@identifier` references and
//! `@(expression)` blocks. Malformed input never fails here: anything that
//! doesn't form a valid reference degrades to body text.

use std::fmt;

/// The kinds of token found in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTokenKind {
    /// Literal text, copied verbatim
    Body,
    /// `contact.age` in `@contact.age`
    Identifier,
    /// `1 + 2` in `@(1 + 2)`
    Expression,
    /// End of the template
    Eof,
}

impl fmt::Display for TemplateTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateTokenKind::Body => write!(f, "BODY"),
            TemplateTokenKind::Identifier => write!(f, "IDENTIFIER"),
            TemplateTokenKind::Expression => write!(f, "EXPRESSION"),
            TemplateTokenKind::Eof => write!(f, "EOF"),
        }
    }
}

/// A scanned template token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateToken {
    pub kind: TemplateTokenKind,
    pub text: String,
}

impl TemplateToken {
    fn new(kind: TemplateTokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The token as it was written in the template
    pub fn source_text(&self) -> String {
        match self.kind {
            TemplateTokenKind::Identifier => format!("@{}", self.text),
            TemplateTokenKind::Expression => format!("@({})", self.text),
            _ => self.text.clone(),
        }
    }
}

/// Whether a character can be part of a name
pub fn is_name_char(ch: char) -> bool {
    ch.is_alphabetic() || ch.is_numeric() || ch == '_'
}

/// Scanner over one template
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    /// Valid top-level names, matched exactly, or `None` to accept every identifier
    top_levels: Option<Vec<String>>,
    /// Whether `@@` in body text becomes `@`
    unescape_body: bool,
}

impl Scanner {
    /// Create a scanner which accepts any identifier
    pub fn new(template: &str) -> Self {
        Self {
            chars: template.chars().collect(),
            pos: 0,
            top_levels: None,
            unescape_body: true,
        }
    }

    /// Only treat `@name...` as an identifier when `name` is one of these
    pub fn with_top_levels<I, S>(mut self, top_levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.top_levels = Some(
            top_levels
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
        );
        self
    }

    /// Set whether `@@` sequences in body text are unescaped to `@`
    pub fn unescape_body(mut self, unescape: bool) -> Self {
        self.unescape_body = unescape;
        self
    }

    /// Scan the next token. Returns [`TemplateTokenKind::Eof`] once the input is exhausted.
    pub fn next_token(&mut self) -> TemplateToken {
        let Some(ch) = self.peek() else {
            return TemplateToken::new(TemplateTokenKind::Eof, "");
        };

        if ch == '@' {
            match self.peek_at(1) {
                Some('(') => {
                    self.pos += 2;
                    return self.scan_expression();
                }
                Some(next) if is_name_char(next) => {
                    self.pos += 1;
                    return self.scan_identifier();
                }
                _ => {}
            }
        }

        self.scan_body()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn read(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Scan the inside of `@(...)`, positioned just after the `(`
    fn scan_expression(&mut self) -> TemplateToken {
        let mut buf = String::new();
        let mut parens = 1;

        while let Some(ch) = self.read() {
            match ch {
                '"' => {
                    buf.push(ch);
                    self.read_text_literal(&mut buf);
                }
                '(' => {
                    buf.push(ch);
                    parens += 1;
                }
                ')' => {
                    parens -= 1;
                    if parens == 0 {
                        return TemplateToken::new(TemplateTokenKind::Expression, buf);
                    }
                    buf.push(ch);
                }
                _ => buf.push(ch),
            }
        }

        TemplateToken::new(TemplateTokenKind::Body, format!("@({}", buf))
    }

    /// Read the rest of a quoted text literal into `buf`, including the closing quote
    fn read_text_literal(&mut self, buf: &mut String) {
        let mut escaped = false;
        while let Some(ch) = self.read() {
            buf.push(ch);
            match ch {
                '"' if !escaped => break,
                '\\' => escaped = !escaped,
                _ => escaped = false,
            }
        }
    }

    /// Scan a `name.key.key` identifier, positioned just after the `@`
    fn scan_identifier(&mut self) -> TemplateToken {
        let mut identifier = String::new();
        let mut top_level: Option<String> = None;

        while let Some(ch) = self.peek() {
            if ch == '.' {
                if top_level.is_none() {
                    top_level = Some(identifier.clone());
                }

                // a period only continues the identifier if a name follows it
                match self.peek_at(1) {
                    Some(next) if is_name_char(next) => {
                        identifier.push(ch);
                        identifier.push(next);
                        self.pos += 2;
                    }
                    _ => break,
                }
            } else if is_name_char(ch) {
                identifier.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }

        let top_level = top_level.unwrap_or_else(|| identifier.clone());

        let valid = match &self.top_levels {
            Some(top_levels) => top_levels.contains(&top_level),
            None => true,
        };

        if valid {
            TemplateToken::new(TemplateTokenKind::Identifier, identifier)
        } else {
            // looked like an identifier but isn't a known top-level, e.g. an email address
            TemplateToken::new(TemplateTokenKind::Body, format!("@{}", identifier))
        }
    }

    /// Scan body text up to the next expression or identifier
    fn scan_body(&mut self) -> TemplateToken {
        let mut buf = String::new();

        while let Some(ch) = self.peek() {
            if ch != '@' {
                buf.push(ch);
                self.pos += 1;
                continue;
            }

            match self.peek_at(1) {
                Some('(') => break,
                Some('@') => {
                    buf.push('@');
                    if !self.unescape_body {
                        buf.push('@');
                    }
                    self.pos += 2;
                }
                Some(next) if is_name_char(next) => break,
                Some(next) => {
                    buf.push('@');
                    buf.push(next);
                    self.pos += 2;
                }
                None => {
                    buf.push('@');
                    self.pos += 1;
                }
            }
        }

        TemplateToken::new(TemplateTokenKind::Body, buf)
    }

}

impl Iterator for Scanner {
    type Item = TemplateToken;

    /// Yields every token up to, but not including, [`TemplateTokenKind::Eof`]
    fn next(&mut self) -> Option<TemplateToken> {
        let token = self.next_token();
        if token.kind == TemplateTokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
