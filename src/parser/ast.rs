//! Abstract Syntax Tree (AST) definitions for Excellent expressions
//!
//! Each node renders back to canonical expression text through `Display`, so
//! a parsed tree can be serialized and parsed again to the same tree.

use std::fmt;

use rust_decimal::Decimal;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a root context value or function: `contact`
    ContextReference(String),
    /// Dot lookup: `contact.name` or `array.0`
    DotLookup(DotLookupExpr),
    /// Bracket lookup: `contact["name"]` or `array[-1]`
    ArrayLookup(ArrayLookupExpr),
    /// Function call: `upper(name)`
    FunctionCall(CallExpr),
    /// Anonymous function: `(a, b) => a + b`
    AnonFunction(AnonFunctionExpr),
    /// Binary operation: `a + b`
    Binary(BinaryExpr),
    /// Negation: `-a`
    Negation(Box<Expr>),
    /// Parenthesized expression: `(expr)`
    Parentheses(Box<Expr>),
    /// Text literal
    Text(String),
    /// Number literal
    Number(Decimal),
    /// Boolean literal
    Boolean(bool),
    /// Null literal
    Null,
}

impl Expr {
    /// Get every context path referenced by this expression, in evaluation order.
    ///
    /// Lookups report each prefix, so `contact.name` yields `contact` then
    /// `contact.name`. Bracket lookups with a literal key are reported as dotted
    /// paths, while computed keys stop the path at the container.
    pub fn context_references(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_references(&mut paths);
        paths
    }

    fn collect_references(&self, paths: &mut Vec<String>) -> Option<String> {
        match self {
            Expr::ContextReference(name) => {
                paths.push(name.clone());
                Some(name.clone())
            }
            Expr::DotLookup(lookup) => {
                let base = lookup.container.collect_references(paths)?;
                let path = format!("{}.{}", base, lookup.key);
                paths.push(path.clone());
                Some(path)
            }
            Expr::ArrayLookup(lookup) => {
                let base = lookup.container.collect_references(paths);
                let key = match lookup.index.as_ref() {
                    Expr::Text(text) => Some(text.clone()),
                    Expr::Number(num) => Some(num.normalize().to_string()),
                    other => {
                        other.collect_references(paths);
                        None
                    }
                };

                let path = format!("{}.{}", base?, key?);
                paths.push(path.clone());
                Some(path)
            }
            Expr::FunctionCall(call) => {
                call.func.collect_references(paths);
                for arg in &call.args {
                    arg.collect_references(paths);
                }
                None
            }
            Expr::AnonFunction(func) => {
                func.body.collect_references(paths);
                None
            }
            Expr::Binary(b) => {
                b.left.collect_references(paths);
                b.right.collect_references(paths);
                None
            }
            Expr::Negation(inner) | Expr::Parentheses(inner) => {
                inner.collect_references(paths);
                None
            }
            Expr::Text(_) | Expr::Number(_) | Expr::Boolean(_) | Expr::Null => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::ContextReference(name) => write!(f, "{}", name),
            // `1 .5` must not render as the number `1.5`
            Expr::DotLookup(lookup) if matches!(*lookup.container, Expr::Number(_)) => {
                write!(f, "{} .{}", lookup.container, lookup.key)
            }
            Expr::DotLookup(lookup) => write!(f, "{}.{}", lookup.container, lookup.key),
            Expr::ArrayLookup(lookup) => write!(f, "{}[{}]", lookup.container, lookup.index),
            Expr::FunctionCall(call) => {
                write!(f, "{}(", call.func)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::AnonFunction(func) => write!(f, "({}) => {}", func.args.join(", "), func.body),
            Expr::Binary(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
            Expr::Negation(inner) => write!(f, "-{}", inner),
            Expr::Parentheses(inner) => write!(f, "({})", inner),
            Expr::Text(text) => write!(f, "{}", quote(text)),
            Expr::Number(num) => write!(f, "{}", num.normalize()),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Null => f.write_str("null"),
        }
    }
}

/// Quote text as an expression literal, escaping what the lexer would decode
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Dot lookup: `container.key`
#[derive(Debug, Clone, PartialEq)]
pub struct DotLookupExpr {
    pub container: Box<Expr>,
    /// A name or an integer, as written
    pub key: String,
}

/// Bracket lookup: `container[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLookupExpr {
    pub container: Box<Expr>,
    pub index: Box<Expr>,
}

/// Function call
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub func: Box<Expr>,
    pub args: Vec<Expr>,
}

/// Anonymous function
#[derive(Debug, Clone, PartialEq)]
pub struct AnonFunctionExpr {
    pub args: Vec<String>,
    pub body: Box<Expr>,
}

/// Binary expression
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Text
    Concatenation,
    // Arithmetic
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Exponent,
    // Equality
    Equality,
    InEquality,
    // Comparison
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Concatenation => write!(f, "&"),
            BinaryOp::Addition => write!(f, "+"),
            BinaryOp::Subtraction => write!(f, "-"),
            BinaryOp::Multiplication => write!(f, "*"),
            BinaryOp::Division => write!(f, "/"),
            BinaryOp::Exponent => write!(f, "^"),
            BinaryOp::Equality => write!(f, "="),
            BinaryOp::InEquality => write!(f, "!="),
            BinaryOp::LessThan => write!(f, "<"),
            BinaryOp::LessThanOrEqual => write!(f, "<="),
            BinaryOp::GreaterThan => write!(f, ">"),
            BinaryOp::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}
