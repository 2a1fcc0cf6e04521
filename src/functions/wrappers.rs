//! Arity and type checking combinators for native functions
//!
//! Each combinator takes a strongly typed implementation and produces a
//! function over raw argument values. Arguments are coerced to the declared
//! types first, and any arity or coercion failure is returned as an error
//! without calling the implementation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::XResult;
use crate::env::Environment;
use crate::types::conversions::{to_array, to_date, to_datetime, to_integer, to_number, to_text};
use crate::types::{Array, Value, XError, ZonedDateTime};

/// Check the number of arguments against a minimum and optional maximum
pub fn check_arity(args: &[Value], min: usize, max: Option<usize>) -> Result<(), XError> {
    let got = args.len();
    match max {
        Some(max) if min == max && got != min => Err(XError::new(format!(
            "need {} argument(s), got {}",
            min, got
        ))),
        None if got < min => Err(XError::new(format!(
            "need at least {} argument(s), got {}",
            min, got
        ))),
        Some(max) if got < min || got > max => Err(XError::new(format!(
            "need {} to {} argument(s), got {}",
            min, max, got
        ))),
        _ => Ok(()),
    }
}

/// Signature of every wrapped function
pub trait NativeFn: Fn(&Environment, &[Value]) -> Value + Send + Sync + 'static {}

impl<F> NativeFn for F where F: Fn(&Environment, &[Value]) -> Value + Send + Sync + 'static {}

/// At least `min` arguments of any type
pub fn min_args(min: usize, f: fn(&Environment, &[Value]) -> XResult) -> impl NativeFn {
    move |env: &Environment, args: &[Value]| match check_arity(args, min, None) {
        Ok(()) => f(env, args).into(),
        Err(err) => Value::Error(err),
    }
}

/// Between `min` and `max` arguments of any type
pub fn min_and_max_args(min: usize, max: usize, f: fn(&Environment, &[Value]) -> XResult) -> impl NativeFn {
    move |env: &Environment, args: &[Value]| match check_arity(args, min, Some(max)) {
        Ok(()) => f(env, args).into(),
        Err(err) => Value::Error(err),
    }
}

pub fn no_args(f: fn(&Environment) -> XResult) -> impl NativeFn {
    num_args_with(0, move |env, _| f(env))
}

pub fn one_arg(f: fn(&Environment, &Value) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, &args[0]))
}

pub fn two_args(f: fn(&Environment, &Value, &Value) -> XResult) -> impl NativeFn {
    num_args_with(2, move |env, args| f(env, &args[0], &args[1]))
}

pub fn three_args(f: fn(&Environment, &Value, &Value, &Value) -> XResult) -> impl NativeFn {
    num_args_with(3, move |env, args| f(env, &args[0], &args[1], &args[2]))
}

pub fn one_text(f: fn(&Environment, String) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, to_text(&args[0])?))
}

pub fn two_text(f: fn(&Environment, String, String) -> XResult) -> impl NativeFn {
    num_args_with(2, move |env, args| f(env, to_text(&args[0])?, to_text(&args[1])?))
}

/// One text argument and an optional second one which defaults to `default`
pub fn text_and_optional_text(default: &'static str, f: fn(&Environment, String, String) -> XResult) -> impl NativeFn {
    move |env: &Environment, args: &[Value]| {
        let result = check_arity(args, 1, Some(2)).and_then(|()| {
            let text = to_text(&args[0])?;
            let other = match args.get(1) {
                Some(arg) => to_text(arg)?,
                None => default.to_string(),
            };
            f(env, text, other)
        });
        Value::from(result)
    }
}

pub fn text_and_integer(f: fn(&Environment, String, i32) -> XResult) -> impl NativeFn {
    num_args_with(2, move |env, args| f(env, to_text(&args[0])?, to_integer(&args[1])?))
}

/// A text argument followed by between `min_other` and `max_other` arguments of any type
pub fn initial_text(min_other: usize, max_other: usize, f: fn(&Environment, String, &[Value]) -> XResult) -> impl NativeFn {
    move |env: &Environment, args: &[Value]| {
        let result = check_arity(args, min_other + 1, Some(max_other + 1))
            .and_then(|()| f(env, to_text(&args[0])?, &args[1..]));
        Value::from(result)
    }
}

pub fn one_number(f: fn(&Environment, Decimal) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, to_number(&args[0])?))
}

pub fn two_number(f: fn(&Environment, Decimal, Decimal) -> XResult) -> impl NativeFn {
    num_args_with(2, move |env, args| f(env, to_number(&args[0])?, to_number(&args[1])?))
}

/// One number and an optional integer which defaults to `default`
pub fn one_number_and_optional_integer(default: i32, f: fn(&Environment, Decimal, i32) -> XResult) -> impl NativeFn {
    move |env: &Environment, args: &[Value]| {
        let result = check_arity(args, 1, Some(2)).and_then(|()| {
            let num = to_number(&args[0])?;
            let int = match args.get(1) {
                Some(arg) => to_integer(arg)?,
                None => default,
            };
            f(env, num, int)
        });
        Value::from(result)
    }
}

pub fn three_integer(f: fn(&Environment, i32, i32, i32) -> XResult) -> impl NativeFn {
    num_args_with(3, move |env, args| {
        f(env, to_integer(&args[0])?, to_integer(&args[1])?, to_integer(&args[2])?)
    })
}

pub fn one_date(f: fn(&Environment, NaiveDate) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, to_date(env, &args[0])?))
}

pub fn one_datetime(f: fn(&Environment, ZonedDateTime) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, to_datetime(env, &args[0])?))
}

pub fn one_array(f: fn(&Environment, Array) -> XResult) -> impl NativeFn {
    num_args_with(1, move |env, args| f(env, to_array(&args[0])?))
}

pub fn two_array(f: fn(&Environment, Array, Array) -> XResult) -> impl NativeFn {
    num_args_with(2, move |env, args| f(env, to_array(&args[0])?, to_array(&args[1])?))
}

/// Exactly `num` arguments, handed to a closure which does its own coercion
fn num_args_with<F>(num: usize, f: F) -> impl NativeFn
where
    F: Fn(&Environment, &[Value]) -> XResult + Send + Sync + 'static,
{
    move |env: &Environment, args: &[Value]| {
        let result = check_arity(args, num, Some(num)).and_then(|()| f(env, args));
        Value::from(result)
    }
}
