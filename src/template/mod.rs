//! Template evaluation
//!
//! A template is body text with `@identifier` and `@(expression)` tokens in
//! it. Each token is evaluated against a context object and its value is
//! written into the output as text. A failing token doesn't stop the rest of
//! the template from being evaluated; its error is collected instead.
//! Warnings, such as reads of deprecated context values, are returned too.

use tracing::debug;

use crate::env::Environment;
use crate::errors::TemplateErrors;
use crate::evaluator::{evaluate_with_warnings, Scope, Warnings};
use crate::parser;
use crate::scanner::{Scanner, TemplateTokenKind};
use crate::types::conversions::to_text;
use crate::types::{Object, Value};

/// Applied to the text of each evaluated token before it's written to the output
pub type Escaping<'a> = &'a dyn Fn(&str) -> String;

/// Evaluate a template, returning its output along with any token errors
/// and warnings.
///
/// Only identifiers whose top-level name is a property of `context` are
/// evaluated, so `foo@bar.com` stays as it is.
pub fn evaluate_template(
    env: &Environment,
    context: &Object,
    template: &str,
    escaping: Option<Escaping<'_>>,
) -> (String, TemplateErrors, Warnings) {
    let warnings = Warnings::new();
    let (output, errors) = render_template(env, context, template, escaping, &warnings);
    (output, errors, warnings)
}

fn render_template(
    env: &Environment,
    context: &Object,
    template: &str,
    escaping: Option<Escaping<'_>>,
    warnings: &Warnings,
) -> (String, TemplateErrors) {
    let mut output = String::with_capacity(template.len());
    let mut errors = TemplateErrors::new();

    for token in scan(context, template) {
        if token.kind == TemplateTokenKind::Body {
            output.push_str(&token.text);
            continue;
        }

        let value = expression(env, context, &token.text, warnings);
        match to_text(&value) {
            Ok(text) => match escaping {
                Some(escape) => output.push_str(&escape(&text)),
                None => output.push_str(&text),
            },
            Err(err) => {
                let source = token.source_text();
                debug!(token = %source, error = %err, "error evaluating template token");
                errors.add(source, err.message());
            }
        }
    }

    (output, errors)
}

/// Like [`evaluate_template`], except that a template which is a single token,
/// e.g. `@contact` or `@(array(1, 2))`, gives the typed value of that token
/// rather than its text.
pub fn evaluate_template_value(
    env: &Environment,
    context: &Object,
    template: &str,
) -> (Value, TemplateErrors, Warnings) {
    let template = template.trim();
    let warnings = Warnings::new();

    let mut tokens = scan(context, template);
    if let (Some(token), None) = (tokens.next(), tokens.next()) {
        if token.kind != TemplateTokenKind::Body {
            let value = expression(env, context, &token.text, &warnings);
            return (value, TemplateErrors::new(), warnings);
        }
    }

    let (output, errors) = render_template(env, context, template, None, &warnings);
    (Value::Text(output), errors, warnings)
}

/// Evaluate a single expression like `contact.name` or `1 + 2`, returning
/// its value and any warnings. Syntax errors become error values.
pub fn evaluate_expression(env: &Environment, context: &Object, source: &str) -> (Value, Warnings) {
    let warnings = Warnings::new();
    let value = expression(env, context, source, &warnings);
    (value, warnings)
}

fn expression(env: &Environment, context: &Object, source: &str, warnings: &Warnings) -> Value {
    match parser::parse(source) {
        Ok(expr) => evaluate_with_warnings(env, &Scope::for_context(context.clone()), &expr, warnings),
        Err(err) => Value::error(err.to_string()),
    }
}

/// Whether a template contains any identifiers or expressions
pub fn has_expressions<S: AsRef<str>>(template: &str, top_levels: &[S]) -> bool {
    Scanner::new(template)
        .with_top_levels(top_levels)
        .any(|token| token.kind != TemplateTokenKind::Body)
}

/// Report every context path a template references, e.g. `contact`,
/// `contact.name`. Tokens that don't parse are skipped.
pub fn audit_context<S, F>(template: &str, top_levels: &[S], mut callback: F)
where
    S: AsRef<str>,
    F: FnMut(&str),
{
    let tokens = Scanner::new(template)
        .with_top_levels(top_levels)
        .filter(|token| token.kind != TemplateTokenKind::Body);

    for token in tokens {
        if let Ok(expr) = parser::parse(&token.text) {
            for path in expr.context_references() {
                callback(&path);
            }
        }
    }
}

/// Scan a template, accepting identifiers that start with a property of `context`
fn scan(context: &Object, template: &str) -> Scanner {
    Scanner::new(template).with_top_levels(context.iter().map(|(key, _)| key.as_str()))
}
