//! Evaluator for Excellent expressions
//!
//! Walks a parsed AST and produces a [`Value`]. Evaluation never fails in the
//! Rust sense: problems become [`Value::Error`]s which short-circuit through
//! their parent nodes.

pub mod scope;
pub mod warnings;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::env::Environment;
use crate::functions::wrappers::check_arity;
use crate::operators;
use crate::parser::ast::*;
use crate::types::conversions::{to_integer, to_text};
use crate::types::{Array, Function, Object, Value};

pub use scope::Scope;
pub use warnings::Warnings;

/// Maximum expression nesting depth before the evaluator bails out
const MAX_EVAL_DEPTH: usize = 128;

/// Evaluate an expression against a scope
pub fn evaluate(env: &Environment, scope: &Arc<Scope>, expr: &Expr) -> Value {
    Evaluator::new(env).eval_expr(expr, scope)
}

/// Evaluate an expression, adding any warnings to `warnings`
pub fn evaluate_with_warnings(env: &Environment, scope: &Arc<Scope>, expr: &Expr, warnings: &Warnings) -> Value {
    Evaluator::with_warnings(env, warnings.clone()).eval_expr(expr, scope)
}

/// Evaluator for one expression tree
pub struct Evaluator<'a> {
    env: &'a Environment,
    warnings: Warnings,
    /// Current recursion depth
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self::with_warnings(env, Warnings::new())
    }

    pub fn with_warnings(env: &'a Environment, warnings: Warnings) -> Self {
        Self {
            env,
            warnings,
            depth: 0,
        }
    }

    /// Warnings gathered so far
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Evaluate an expression
    pub fn eval_expr(&mut self, expr: &Expr, scope: &Arc<Scope>) -> Value {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            self.depth -= 1;
            return Value::error(format!(
                "expression nesting exceeds maximum depth of {}",
                MAX_EVAL_DEPTH
            ));
        }
        let result = self.eval_expr_inner(expr, scope);
        self.depth -= 1;
        result
    }

    fn eval_expr_inner(&mut self, expr: &Expr, scope: &Arc<Scope>) -> Value {
        match expr {
            Expr::Null => Value::Null,
            Expr::Boolean(b) => Value::Boolean(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::ContextReference(name) => self.eval_reference(name, scope),
            Expr::DotLookup(lookup) => self.eval_dot_lookup(lookup, scope),
            Expr::ArrayLookup(lookup) => self.eval_array_lookup(lookup, scope),
            Expr::FunctionCall(call) => self.eval_call(call, scope),
            Expr::AnonFunction(func) => eval_anon_function(func, scope, &self.warnings),
            Expr::Binary(bin) => self.eval_binary(bin, scope),
            Expr::Negation(inner) => {
                let value = self.eval_expr(inner, scope);
                operators::negate(&value)
            }
            Expr::Parentheses(inner) => self.eval_expr(inner, scope),
        }
    }

    /// Evaluate a reference to a context value or function
    fn eval_reference(&self, name: &str, scope: &Scope) -> Value {
        let Some(value) = scope.get(name) else {
            return Value::error(format!("context has no property '{}'", name));
        };
        if !value.is_null() {
            if let Some(message) = scope.deprecation(name) {
                self.warnings.deprecated_context(&message);
            }
        }
        value
    }

    /// Get an object property, noting if it's deprecated
    fn object_property(&self, object: &Object, key: &str) -> Option<Value> {
        let value = object.get(key)?;
        if !value.is_null() {
            if let Some(message) = object.deprecation(key) {
                self.warnings.deprecated_context(message);
            }
        }
        Some(value.clone())
    }

    /// Evaluate `container.key`, where a missing object property is an error
    fn eval_dot_lookup(&mut self, lookup: &DotLookupExpr, scope: &Arc<Scope>) -> Value {
        let container = self.eval_expr(&lookup.container, scope);
        match &container {
            Value::Error(_) => container,
            Value::Array(array) => index_array(array, &Value::text(lookup.key.as_str())),
            Value::Object(object) => self.object_property(object, &lookup.key).unwrap_or_else(|| {
                Value::error(format!(
                    "{} has no property '{}'",
                    container.describe(),
                    lookup.key
                ))
            }),
            other => Value::error(format!("{} doesn't support lookups", other.describe())),
        }
    }

    /// Evaluate `container[index]`, where a missing object property is null
    fn eval_array_lookup(&mut self, lookup: &ArrayLookupExpr, scope: &Arc<Scope>) -> Value {
        let container = self.eval_expr(&lookup.container, scope);
        if container.is_error() {
            return container;
        }
        let index = self.eval_expr(&lookup.index, scope);
        if index.is_error() {
            return index;
        }

        match &container {
            Value::Array(array) => index_array(array, &index),
            Value::Object(object) => match to_text(&index) {
                Ok(key) => self.object_property(object, &key).unwrap_or_default(),
                Err(err) => Value::Error(err),
            },
            other => Value::error(format!("{} doesn't support lookups", other.describe())),
        }
    }

    /// Evaluate a function call. Every argument is evaluated and passed on,
    /// including errors, so functions like `is_error` can inspect them.
    fn eval_call(&mut self, call: &CallExpr, scope: &Arc<Scope>) -> Value {
        let callee = self.eval_expr(&call.func, scope);
        let function = match callee {
            Value::Function(function) => function,
            Value::Error(err) => return Value::Error(err),
            _ => return Value::error(format!("{} is not a function", call.func)),
        };

        let args: Vec<Value> = call.args.iter().map(|a| self.eval_expr(a, scope)).collect();

        trace!(function = function.name().unwrap_or("<anonymous>"), args = args.len(), "calling function");
        function.call(self.env, &args)
    }

    /// Evaluate a binary operation, left operand first
    fn eval_binary(&mut self, bin: &BinaryExpr, scope: &Arc<Scope>) -> Value {
        let left = self.eval_expr(&bin.left, scope);
        if left.is_error() {
            return left;
        }
        let right = self.eval_expr(&bin.right, scope);
        operators::apply(bin.op, &left, &right)
    }
}

/// Create a closure over the defining scope. Calling it binds arguments by
/// position in a child scope and evaluates the body there, reporting warnings
/// to the evaluation that created it.
fn eval_anon_function(func: &AnonFunctionExpr, scope: &Arc<Scope>, warnings: &Warnings) -> Value {
    let params = func.args.clone();
    let body = Arc::new((*func.body).clone());
    let captured = Arc::clone(scope);
    let warnings = warnings.clone();

    Value::Function(Function::anonymous(move |env, args| {
        if let Err(err) = check_arity(args, params.len(), Some(params.len())) {
            return Value::Error(err);
        }

        let bindings: IndexMap<String, Value> = params.iter().cloned().zip(args.iter().cloned()).collect();
        let local = captured.child(Object::new(bindings));
        evaluate_with_warnings(env, &local, &body, &warnings)
    }))
}

/// Index into an array. Negative indexes count back from the end.
fn index_array(array: &Array, index: &Value) -> Value {
    let index = match to_integer(index) {
        Ok(i) => i64::from(i),
        Err(err) => return Value::Error(err),
    };

    let len = array.len() as i64;
    let actual = if index < 0 { index + len } else { index };

    match usize::try_from(actual).ok().and_then(|i| array.get(i)) {
        Some(value) => value.clone(),
        None => Value::error(format!("index {} out of range for {} items", index, len)),
    }
}
