//! Number functions

use rust_decimal::Decimal;

use super::wrappers::{min_args, no_args, one_number, one_number_and_optional_integer, two_number};
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::conversions::to_number;
use crate::types::{number, Value};

pub(super) fn register(r: &mut Registry) {
    r.add("round", one_number_and_optional_integer(0, round));
    r.add("round_up", one_number_and_optional_integer(0, round_up));
    r.add("round_down", one_number_and_optional_integer(0, round_down));
    r.add("max", min_args(1, max));
    r.add("min", min_args(1, min));
    r.add("mean", min_args(1, mean));
    r.add("mod", two_number(modulo));
    r.add("rand", no_args(rand));
    r.add("rand_between", two_number(rand_between));
    r.add("abs", one_number(abs));
}

/// `round(12.141, 2)` -> `12.14`, and negative places round to tens, hundreds etc
fn round(_: &Environment, n: Decimal, places: i32) -> XResult {
    Ok(Value::Number(number::round(n, places)))
}

fn round_up(_: &Environment, n: Decimal, places: i32) -> XResult {
    Ok(Value::Number(number::round_up(n, places)))
}

fn round_down(_: &Environment, n: Decimal, places: i32) -> XResult {
    Ok(Value::Number(number::round_down(n, places)))
}

/// Convert every argument, failing on the first that isn't a number
fn numbers(args: &[Value]) -> Result<Vec<Decimal>, crate::types::XError> {
    args.iter().map(to_number).collect()
}

fn max(_: &Environment, args: &[Value]) -> XResult {
    let nums = numbers(args)?;
    Ok(nums.into_iter().max().map(Value::Number).unwrap_or_default())
}

fn min(_: &Environment, args: &[Value]) -> XResult {
    let nums = numbers(args)?;
    Ok(nums.into_iter().min().map(Value::Number).unwrap_or_default())
}

fn mean(_: &Environment, args: &[Value]) -> XResult {
    let nums = numbers(args)?;
    let mut sum = Decimal::ZERO;
    for n in &nums {
        sum = number::add(sum, *n)?;
    }
    number::div(sum, Decimal::from(nums.len())).map(Value::Number)
}

fn modulo(_: &Environment, dividend: Decimal, divisor: Decimal) -> XResult {
    number::modulo(dividend, divisor).map(Value::Number)
}

/// A random number in `[0, 1)` from the environment's random source
fn rand(env: &Environment) -> XResult {
    Ok(Value::Number(env.random()))
}

/// A random whole number between `min` and `max` inclusive
fn rand_between(env: &Environment, min: Decimal, max: Decimal) -> XResult {
    let span = number::add(number::sub(max, min)?, Decimal::ONE)?;
    let value = number::add(number::mul(env.random(), span)?, min)?;
    Ok(Value::Number(value.floor()))
}

fn abs(_: &Environment, n: Decimal) -> XResult {
    Ok(Value::Number(n.abs()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rounding() {
        assert_eq!(render("round", &[text("10.5"), text("0")]), "11");
        assert_eq!(render("round", &[text("10.5"), text("1")]), "10.5");
        assert_eq!(render("round", &[text("10.51"), text("1")]), "10.5");
        assert_eq!(render("round", &[text("10.56"), text("1")]), "10.6");
        assert_eq!(render("round", &[text("12.56"), text("-1")]), "10");
        assert_eq!(render("round", &[text("10.5")]), "11");
        assert_eq!(render("round", &[text("not_num"), text("1")]), "ERROR");
        assert_eq!(render("round", &[text("10.5"), text("not_num")]), "ERROR");
        assert_eq!(
            call("round", &[text("10.5"), text("1"), text("30")]),
            Value::error("error calling ROUND: need 1 to 2 argument(s), got 3")
        );

        assert_eq!(render("round_down", &[text("10.7")]), "10");
        assert_eq!(render("round_down", &[text("10")]), "10");
        assert_eq!(render("round_up", &[text("10.2")]), "11");
        assert_eq!(render("round_up", &[text("10")]), "10");
        assert_eq!(render("round_up", &[]), "ERROR");
    }

    #[test]
    fn test_rounding_with_extreme_places() {
        for name in ["round", "round_up", "round_down"] {
            assert!(!call(name, &[text("1"), text("-2147483648")]).is_error());
            assert_eq!(render(name, &[text("1.25"), text("2147483647")]), "1.25");
        }
        assert_eq!(render("round", &[text("1"), text("-2147483648")]), "0");
        assert_eq!(render("round_up", &[text("1"), text("-2147483648")]), "1");
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(render("max", &[text("10.5"), text("11")]), "11");
        assert_eq!(render("max", &[text("10.2"), text("9")]), "10.2");
        assert_eq!(render("max", &[text("9"), text("not_num")]), "ERROR");
        assert_eq!(
            call("max", &[]),
            Value::error("error calling MAX: need at least 1 argument(s), got 0")
        );
        assert_eq!(render("min", &[text("10.5"), text("11")]), "10.5");
        assert_eq!(render("min", &[text("10.2"), text("9")]), "9");
        assert_eq!(render("mean", &[text("10"), text("11")]), "10.5");
        assert_eq!(render("mean", &[text("10.2")]), "10.2");
        assert_eq!(render("mean", &[text("9"), text("not_num")]), "ERROR");
    }

    #[test]
    fn test_mod_and_abs() {
        assert_eq!(render("mod", &[text("10"), text("3")]), "1");
        assert_eq!(render("mod", &[text("10"), text("5")]), "0");
        assert_eq!(render("mod", &[text("not_num"), text("3")]), "ERROR");
        assert_eq!(render("abs", &[num("-33")]), "33");
        assert_eq!(render("abs", &[text("nan")]), "ERROR");
    }

    #[test]
    fn test_random() {
        for _ in 0..20 {
            let Value::Number(n) = call("rand", &[]) else {
                panic!("rand should return a number");
            };
            assert!(n >= Decimal::ZERO && n < Decimal::ONE);

            let Value::Number(n) = call("rand_between", &[num("1"), num("10")]) else {
                panic!("rand_between should return a number");
            };
            assert!(n >= Decimal::ONE && n <= Decimal::TEN);
            assert!(n.fract().is_zero());
        }

        // a seeded source makes results repeatable
        assert_eq!(call("rand", &[]), call("rand", &[]));
        assert_eq!(render("rand", &[num("1")]), "ERROR");
    }
}
