//! Parser for Excellent expressions
//!
//! This module implements a recursive descent parser that produces an AST
//! from a token stream. Each precedence level has its own method, loosest
//! first: `&`, then `=`/`!=`, comparisons, `+`/`-`, `*`/`/`, `^`, unary minus
//! and anonymous functions, and finally postfix lookups and calls.

pub mod ast;

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::SyntaxError;
use crate::lexer::token::{SourceLocation, Token, TokenKind};
use crate::lexer::Lexer;
use ast::*;

/// Maximum parse recursion depth before the parser bails out.
/// Each nesting level expands to ~10 intermediate stack frames.
const MAX_PARSE_DEPTH: usize = 128;

/// Parse a single expression, e.g. `contact.name` or `1 + count(fields)`
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let result = Lexer::new(source)
        .tokenize()
        .and_then(|tokens| Parser::new(tokens, source).parse());

    if let Err(err) = &result {
        debug!(expression = source, error = %err, "failed to parse expression");
    }

    result
}

/// Parser for Excellent expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
    /// Current recursion depth
    depth: usize,
}

impl Parser {
    /// Create a new parser from a token stream
    pub fn new(tokens: Vec<Token>, source: impl Into<String>) -> Self {
        Self {
            tokens,
            pos: 0,
            source: source.into(),
            depth: 0,
        }
    }

    /// Parse the whole token stream as one expression
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expr()?;

        if !self.is_at_end() {
            return Err(self.error_unexpected("an operator or the end of the expression"));
        }

        Ok(expr)
    }

    /// Parse an expression
    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.enter()?;
        let result = self.parse_concatenation();
        self.depth -= 1;
        result
    }

    /// Track one more level of recursion, failing once the limit is exceeded
    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            self.depth -= 1;
            return Err(SyntaxError::at(
                self.source.clone(),
                &self.current_location(),
                format!(
                    "expression nesting exceeds maximum depth of {}; simplify the expression",
                    MAX_PARSE_DEPTH
                ),
            ));
        }
        Ok(())
    }

    /// Parse concatenation: `a & b`
    fn parse_concatenation(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::Ampersand) {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(left, BinaryOp::Concatenation, right);
        }

        Ok(left)
    }

    /// Parse equality expression: `a = b`, `a != b`
    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;

        while matches!(self.current().kind, TokenKind::Eq | TokenKind::NotEq) {
            let op = match &self.current().kind {
                TokenKind::Eq => BinaryOp::Equality,
                _ => BinaryOp::InEquality,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse comparison expression: `a < b`, `a >= b`, etc.
    ///
    /// Chains like `1 < 2 < 3` parse left to right, and then fail at evaluation
    /// because a boolean can't be compared with a number.
    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_additive()?;

        while matches!(
            self.current().kind,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
        ) {
            let op = match &self.current().kind {
                TokenKind::Lt => BinaryOp::LessThan,
                TokenKind::LtEq => BinaryOp::LessThanOrEqual,
                TokenKind::Gt => BinaryOp::GreaterThan,
                _ => BinaryOp::GreaterThanOrEqual,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse additive expression: `a + b`, `a - b`
    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = match &self.current().kind {
                TokenKind::Plus => BinaryOp::Addition,
                _ => BinaryOp::Subtraction,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse multiplicative expression: `a * b`, `a / b`
    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_exponent()?;

        while matches!(self.current().kind, TokenKind::Star | TokenKind::Slash) {
            let op = match &self.current().kind {
                TokenKind::Star => BinaryOp::Multiplication,
                _ => BinaryOp::Division,
            };
            self.advance();
            let right = self.parse_exponent()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse exponent expression: `a ^ b` (right associative)
    fn parse_exponent(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_unary()?;

        if self.check(&TokenKind::Caret) {
            self.advance();
            self.enter()?;
            let exponent = self.parse_exponent();
            self.depth -= 1;
            return Ok(binary(base, BinaryOp::Exponent, exponent?));
        }

        Ok(base)
    }

    /// Parse unary expression: `-a` or an anonymous function `(a, b) => body`
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(&TokenKind::Minus) {
            self.advance();
            self.enter()?;
            let operand = self.parse_unary();
            self.depth -= 1;
            return Ok(Expr::Negation(Box::new(operand?)));
        }

        if self.is_anon_function() {
            return self.parse_anon_function();
        }

        self.parse_postfix()
    }

    /// Check whether the tokens ahead are `( names ) =>`
    fn is_anon_function(&self) -> bool {
        if !self.check(&TokenKind::LeftParen) {
            return false;
        }

        let mut i = self.pos + 1;
        let mut expect_name = true;
        while let Some(token) = self.tokens.get(i) {
            match (&token.kind, expect_name) {
                (TokenKind::Name(_), true) => expect_name = false,
                (TokenKind::Comma, false) => expect_name = true,
                (TokenKind::RightParen, _) => {
                    // `(a, ) =>` is not a valid parameter list
                    let trailing_comma = expect_name && i != self.pos + 1;
                    return !trailing_comma
                        && matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Arrow)
                        );
                }
                _ => return false,
            }
            i += 1;
        }
        false
    }

    /// Parse an anonymous function: `(a, b) => body`
    fn parse_anon_function(&mut self) -> Result<Expr, SyntaxError> {
        self.expect(&TokenKind::LeftParen)?;

        let mut args = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            args.push(self.expect_name("a parameter name")?);
            if !self.check(&TokenKind::RightParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::Arrow)?;
        let body = self.parse_expr()?;

        Ok(Expr::AnonFunction(AnonFunctionExpr {
            args,
            body: Box::new(body),
        }))
    }

    /// Parse postfix expression: function calls, bracket lookups, dot lookups
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current().kind {
                TokenKind::LeftParen => {
                    self.advance();
                    let mut args = Vec::new();

                    while !self.check(&TokenKind::RightParen) {
                        args.push(self.parse_expr()?);
                        if !self.check(&TokenKind::RightParen) {
                            self.expect(&TokenKind::Comma)?;
                            if self.check(&TokenKind::RightParen) {
                                return Err(self.error_unexpected("an argument"));
                            }
                        }
                    }

                    self.expect(&TokenKind::RightParen)?;

                    expr = Expr::FunctionCall(CallExpr {
                        func: Box::new(expr),
                        args,
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RightBracket)?;

                    expr = Expr::ArrayLookup(ArrayLookupExpr {
                        container: Box::new(expr),
                        index: Box::new(index),
                    });
                }
                TokenKind::Dot => {
                    self.advance();
                    let key = match &self.current().kind {
                        TokenKind::Name(name) | TokenKind::Number(name) => name.clone(),
                        _ => return Err(self.error_unexpected("a property name or index")),
                    };
                    self.advance();

                    expr = Expr::DotLookup(DotLookupExpr {
                        container: Box::new(expr),
                        key,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match &self.current().kind.clone() {
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Boolean(false))
            }
            TokenKind::Number(text) => {
                let num = Decimal::from_str(text)
                    .map_err(|_| self.error_unexpected("a number small enough to represent"))?;
                self.advance();
                Ok(Expr::Number(num))
            }
            TokenKind::Text(text) => {
                self.advance();
                Ok(Expr::Text(text.clone()))
            }
            TokenKind::Name(name) => {
                self.advance();
                Ok(Expr::ContextReference(name.clone()))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Parentheses(Box::new(inner)))
            }
            _ => Err(self.error_unexpected("an expression")),
        }
    }

    // Helper methods

    /// Get the current token
    fn current(&self) -> &Token {
        // the lexer always ends the stream with Eof, so clamp to the last token
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    /// Get the current token's location
    fn current_location(&self) -> SourceLocation {
        self.current().location.clone()
    }

    /// Check if we're at the end of input
    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Check if current token matches expected kind
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Expect a specific token kind
    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_unexpected(&format!("'{}'", kind)))
        }
    }

    /// Expect a name and return it
    fn expect_name(&mut self, context: &str) -> Result<String, SyntaxError> {
        if let TokenKind::Name(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_unexpected(context))
        }
    }

    /// Create an "unexpected token" error
    fn error_unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::at(
            self.source.clone(),
            &self.current_location(),
            format!("expected {}, found {}", expected, self.current().kind),
        )
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}
