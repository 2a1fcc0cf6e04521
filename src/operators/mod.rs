//! Binary and unary operators
//!
//! Each operator coerces its operands only as far as it needs to and returns
//! the first coercion error it hits.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::parser::ast::BinaryOp;
use crate::types::conversions::{to_number, to_text};
use crate::types::datetime::add_date;
use crate::types::{number, Value, XError};

/// Apply a binary operator to two evaluated operands
pub fn apply(op: BinaryOp, left: &Value, right: &Value) -> Value {
    // errors short-circuit before any coercion, left operand first
    if left.is_error() {
        return left.clone();
    }
    if right.is_error() {
        return right.clone();
    }

    let result = match op {
        BinaryOp::Concatenation => concatenate(left, right),
        BinaryOp::Addition => add(left, right),
        BinaryOp::Subtraction => subtract(left, right),
        BinaryOp::Multiplication => numerical(left, right, number::mul),
        BinaryOp::Division => numerical(left, right, number::div),
        BinaryOp::Exponent => numerical(left, right, number::pow),
        BinaryOp::Equality => Ok(Value::Boolean(left == right)),
        BinaryOp::InEquality => Ok(Value::Boolean(left != right)),
        BinaryOp::LessThan => compare(left, right).map(|o| Value::Boolean(o.is_lt())),
        BinaryOp::LessThanOrEqual => compare(left, right).map(|o| Value::Boolean(o.is_le())),
        BinaryOp::GreaterThan => compare(left, right).map(|o| Value::Boolean(o.is_gt())),
        BinaryOp::GreaterThanOrEqual => compare(left, right).map(|o| Value::Boolean(o.is_ge())),
    };

    result.into()
}

/// Unary minus
pub fn negate(value: &Value) -> Value {
    match to_number(value) {
        Ok(n) => Value::Number(-n),
        Err(err) => Value::Error(err),
    }
}

fn concatenate(left: &Value, right: &Value) -> Result<Value, XError> {
    let mut text = to_text(left)?;
    text.push_str(&to_text(right)?);
    Ok(Value::Text(text))
}

fn numerical(
    left: &Value,
    right: &Value,
    op: fn(Decimal, Decimal) -> Result<Decimal, XError>,
) -> Result<Value, XError> {
    let a = to_number(left)?;
    let b = to_number(right)?;
    op(a, b).map(Value::Number)
}

/// Add whole days to a date or datetime
fn add_days(date: &Value, days: &Value) -> Result<Value, XError> {
    let days = i64::from(number::to_integer(to_number(days)?)?);
    let out_of_range = || XError::new("date value out of range");
    match date {
        Value::Date(d) => add_date(*d, 0, 0, days).map(Value::Date).ok_or_else(out_of_range),
        Value::DateTime(dt) => dt
            .add_date(0, 0, days)
            .map(Value::DateTime)
            .ok_or_else(out_of_range),
        other => Err(XError::new(format!("{} isn't a date", other.describe()))),
    }
}

fn is_date(value: &Value) -> bool {
    matches!(value, Value::Date(_) | Value::DateTime(_))
}

fn add(left: &Value, right: &Value) -> Result<Value, XError> {
    match (is_date(left), is_date(right)) {
        (true, false) => add_days(left, right),
        (false, true) => add_days(right, left),
        _ => numerical(left, right, number::add),
    }
}

fn subtract(left: &Value, right: &Value) -> Result<Value, XError> {
    if is_date(left) && !is_date(right) {
        let days = number::to_integer(to_number(right)?)?;
        return add_days(left, &Value::from(-i64::from(days)));
    }
    numerical(left, right, number::sub)
}

/// Order two operands. Dates, datetimes and times compare with their own
/// kind, everything else numerically.
fn compare(left: &Value, right: &Value) -> Result<Ordering, XError> {
    match (left, right) {
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
        _ => Ok(to_number(left)?.cmp(&to_number(right)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn num(s: &str) -> Value {
        Value::Number(Decimal::from_str(s).unwrap())
    }

    fn op(op: BinaryOp, a: Value, b: Value) -> Value {
        apply(op, &a, &b)
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(op(BinaryOp::Concatenation, Value::text("hello"), Value::text("world")), Value::text("helloworld"));
        assert_eq!(op(BinaryOp::Concatenation, Value::text("hello"), Value::Null), Value::text("hello"));
        assert_eq!(op(BinaryOp::Concatenation, num("1"), num("3")), Value::text("13"));
    }

    #[test]
    fn test_errors_short_circuit() {
        let err = Value::error("left");
        assert_eq!(op(BinaryOp::Addition, err.clone(), Value::error("right")), err);
        assert_eq!(op(BinaryOp::Equality, num("1"), err.clone()), err);
        assert_eq!(op(BinaryOp::Concatenation, num("1"), err.clone()), err);
        assert_eq!(negate(&err), err);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(op(BinaryOp::Addition, num("1.5"), num("2.3")), num("3.8"));
        assert_eq!(op(BinaryOp::Addition, Value::text("1"), Value::text("3")), num("4"));
        assert_eq!(op(BinaryOp::Subtraction, num("1"), num("3")), num("-2"));
        assert_eq!(op(BinaryOp::Multiplication, num("1.5"), num("2.3")), num("3.45"));
        assert_eq!(op(BinaryOp::Division, num("3"), num("2")), num("1.5"));
        assert_eq!(op(BinaryOp::Division, num("3"), num("0")), Value::error("division by zero"));
        assert_eq!(op(BinaryOp::Exponent, num("2"), num("32.000")), num("4294967296"));
        assert_eq!(op(BinaryOp::Exponent, num("9"), num("0.5")), num("3"));
        assert_eq!(op(BinaryOp::Exponent, num("4"), num("2.5")), num("32"));
        assert_eq!(
            op(BinaryOp::Addition, Value::text("x"), num("1")),
            Value::error("unable to convert \"x\" to a number")
        );
        assert_eq!(negate(&num("23")), num("-23"));
    }

    #[test]
    fn test_date_arithmetic() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2018, 4, 30).unwrap());
        assert_eq!(
            op(BinaryOp::Addition, date.clone(), num("1")),
            Value::Date(NaiveDate::from_ymd_opt(2018, 5, 1).unwrap())
        );
        assert_eq!(
            op(BinaryOp::Addition, num("-30"), date.clone()),
            Value::Date(NaiveDate::from_ymd_opt(2018, 3, 31).unwrap())
        );
        assert_eq!(
            op(BinaryOp::Subtraction, date.clone(), num("30")),
            Value::Date(NaiveDate::from_ymd_opt(2018, 3, 31).unwrap())
        );
        assert!(op(BinaryOp::Addition, date.clone(), date).is_error());
    }

    #[test]
    fn test_equality() {
        assert_eq!(op(BinaryOp::Equality, num("1.0"), num("1")), Value::Boolean(true));
        assert_eq!(op(BinaryOp::Equality, Value::text("hello"), Value::text("hello")), Value::Boolean(true));
        assert_eq!(op(BinaryOp::Equality, Value::text("1"), num("1")), Value::Boolean(false));
        assert_eq!(op(BinaryOp::InEquality, Value::Null, Value::Null), Value::Boolean(false));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(op(BinaryOp::LessThan, num("2"), num("3")), Value::Boolean(true));
        assert_eq!(op(BinaryOp::LessThanOrEqual, num("3"), num("3")), Value::Boolean(true));
        assert_eq!(op(BinaryOp::GreaterThan, num("3"), num("3")), Value::Boolean(false));
        assert_eq!(op(BinaryOp::GreaterThanOrEqual, Value::text("4"), num("3")), Value::Boolean(true));
        assert!(op(BinaryOp::GreaterThan, Value::text("foo"), Value::text("bar")).is_error());
        assert!(op(BinaryOp::LessThan, Value::Boolean(true), num("3")).is_error());

        let d1 = Value::Date(NaiveDate::from_ymd_opt(2018, 4, 1).unwrap());
        let d2 = Value::Date(NaiveDate::from_ymd_opt(2018, 4, 2).unwrap());
        assert_eq!(op(BinaryOp::LessThan, d1, d2), Value::Boolean(true));
    }
}
