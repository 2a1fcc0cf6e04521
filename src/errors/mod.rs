//! Error types, diagnostics, and result aliases for the Excellent engine.
//!
//! Two channels exist and are never conflated: syntax errors come from the
//! parser as [`SyntaxError`] diagnostics, while evaluation failures are values
//! (see [`crate::types::XError`]). Template evaluation gathers the latter into
//! [`TemplateErrors`].

use std::fmt;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::lexer::token::SourceLocation;

/// Number of characters of source quoted in a syntax error
const EXCERPT_LENGTH: usize = 10;

/// A syntax error in a single expression
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(E0001), help("{help}"))]
pub struct SyntaxError {
    pub message: String,
    /// Line of the offending token (1-indexed)
    pub line: usize,
    /// Column of the offending token (1-indexed)
    pub column: usize,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
    pub help: String,
}

impl SyntaxError {
    /// Create a syntax error for the token at `location`
    pub fn at(src: impl Into<String>, location: &SourceLocation, help: impl Into<String>) -> Self {
        let src = src.into();
        let excerpt: String = src
            .get(location.offset..)
            .unwrap_or_default()
            .chars()
            .take(EXCERPT_LENGTH)
            .collect();

        let message = if excerpt.is_empty() {
            "syntax error at end of expression".to_string()
        } else {
            format!("syntax error at {}", excerpt)
        };

        Self {
            message,
            line: location.line,
            column: location.column,
            span: (location.offset, location.length).into(),
            src,
            help: help.into(),
        }
    }
}

/// One failed token from a template evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error evaluating {token}: {message}")]
pub struct TemplateError {
    /// The token as written in the template, e.g. `@contact.name` or `@(1 / 0)`
    pub token: String,
    pub message: String,
}

/// All the errors collected while evaluating one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateErrors {
    errors: Vec<TemplateError>,
}

impl TemplateErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: impl Into<String>, message: impl Into<String>) {
        self.errors.push(TemplateError {
            token: token.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TemplateError] {
        &self.errors
    }
}

impl fmt::Display for TemplateErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for TemplateErrors {}

/// Main error type for the crate
#[derive(Error, Debug, Diagnostic)]
pub enum ExcellentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{0}")]
    #[diagnostic(code(E0002))]
    Template(#[from] TemplateErrors),

    #[error("unknown time zone {name}")]
    #[diagnostic(code(E0101), help("use an IANA name such as \"America/Guayaquil\""))]
    InvalidTimezone { name: String },

    #[error("invalid date format: {format}")]
    #[diagnostic(code(E0102), help("use one of YYYY-MM-DD, MM-DD-YYYY or DD-MM-YYYY"))]
    InvalidDateFormat { format: String },

    #[error("invalid time format: {format}")]
    #[diagnostic(code(E0103), help("use one of tt:mm, h:mm aa, tt:mm:ss or h:mm:ss aa"))]
    InvalidTimeFormat { format: String },

    #[error("invalid environment: {0}")]
    #[diagnostic(code(E0104))]
    Config(#[from] serde_json::Error),
}

/// Result type alias for fallible crate operations
pub type ExcellentResult<T> = Result<T, ExcellentError>;
