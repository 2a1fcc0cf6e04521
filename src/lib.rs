// Rust 1.93+ triggers false positives on thiserror/miette derive macro fields
#![allow(unused_assignments)]

//! Excellent expression and templating language
//!
//! Templates mix literal text with `@identifier` references and
//! `@(expression)` blocks that are evaluated against a context of typed
//! values. Evaluation problems are values, not panics: they propagate
//! through expressions as [`Value::Error`] and are gathered per template.
//!
//! # Example
//!
//! ```
//! use excellent::{evaluate_template, Environment, Object, Value};
//!
//! let env = Environment::builder().build();
//! let context: Object = [("name", Value::text("Bob"))].into_iter().collect();
//!
//! let (output, errors, _warnings) = evaluate_template(&env, &context, "Hi @(upper(name))!", None);
//! assert_eq!(output, "Hi BOB!");
//! assert!(errors.is_empty());
//! ```

pub mod env;
pub mod errors;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod scanner;
pub mod template;
pub mod types;

pub use env::{
    Clock, DateFormat, Environment, EnvironmentBuilder, FixedClock, NumberFormat, RandomSource,
    SeededRandom, TimeFormat,
};
pub use errors::{ExcellentError, ExcellentResult, SyntaxError, TemplateError, TemplateErrors};
pub use evaluator::{evaluate, evaluate_with_warnings, Evaluator, Scope, Warnings};
pub use lexer::token::{SourceLocation, Token, TokenKind};
pub use lexer::Lexer;
pub use parser::ast::{self, Expr};
pub use parser::{parse, Parser};
pub use scanner::{Scanner, TemplateToken, TemplateTokenKind};
pub use template::{
    audit_context, evaluate_expression, evaluate_template, evaluate_template_value, has_expressions,
    Escaping,
};
pub use types::{Array, Function, Object, Value, XError, ZonedDateTime};
