//! Array functions

use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::wrappers::{one_array, two_args, two_array};
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::conversions::{to_array, to_number, to_text};
use crate::types::{number, Array, Value};

pub(super) fn register(r: &mut Registry) {
    r.add("join", two_args(join));
    r.add("reverse", one_array(reverse));
    r.add("sort", one_array(sort));
    r.add("sum", one_array(sum));
    r.add("unique", one_array(unique));
    r.add("concat", two_array(concat));
}

/// `join(array("a", "b", "c"), "|")` -> `a|b|c`
fn join(_: &Environment, array: &Value, separator: &Value) -> XResult {
    let array = to_array(array)?;
    let separator = to_text(separator)?;

    let items = array.iter().map(to_text).collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Text(items.join(&separator)))
}

fn reverse(_: &Environment, array: Array) -> XResult {
    Ok(Value::Array(array.iter().rev().cloned().collect()))
}

/// Stable sort, failing if any item can't be compared
fn sort(_: &Environment, array: Array) -> XResult {
    for item in &array {
        item.compare(item)?;
    }

    let mut sorted = array.items().to_vec();
    sorted.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    Ok(Value::array(sorted))
}

fn sum(_: &Environment, array: Array) -> XResult {
    let mut total = Decimal::ZERO;
    for item in &array {
        total = number::add(total, to_number(item)?)?;
    }
    Ok(Value::Number(total))
}

/// Items in order of first appearance, without repeats
fn unique(_: &Environment, array: Array) -> XResult {
    let mut seen: Vec<Value> = Vec::with_capacity(array.len());
    for item in &array {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    Ok(Value::array(seen))
}

fn concat(_: &Environment, array1: Array, array2: Array) -> XResult {
    Ok(Value::Array(array1.iter().chain(array2.iter()).cloned().collect()))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn arr(items: &[Value]) -> Value {
        Value::array(items.to_vec())
    }

    #[test]
    fn test_join() {
        assert_eq!(render("join", &[arr(&[text("1"), text("2"), text("3")]), text(",")]), "1,2,3");
        assert_eq!(render("join", &[arr(&[]), text(",")]), "");
        assert_eq!(render("join", &[arr(&[text("1,2,3")]), Value::Null]), "1,2,3");
        assert_eq!(render("join", &[arr(&[text("1"), Value::error("x")]), text(",")]), "ERROR");
        assert_eq!(
            call("join", &[text("1,2,3"), Value::Null]),
            Value::error("error calling JOIN: unable to convert \"1,2,3\" to an array")
        );
        assert_eq!(render("join", &[arr(&[text("1")])]), "ERROR");
    }

    #[test]
    fn test_reverse_and_concat() {
        assert_eq!(render("reverse", &[arr(&[num("3"), num("1"), num("2")])]), "[2, 1, 3]");
        assert_eq!(render("reverse", &[arr(&[])]), "[]");
        assert_eq!(
            render("concat", &[arr(&[text("a"), text("b")]), arr(&[text("c"), text("d")])]),
            "[a, b, c, d]"
        );
        assert_eq!(render("concat", &[arr(&[text("a")]), Value::Null]), "[a]");
    }

    #[test]
    fn test_sort() {
        assert_eq!(render("sort", &[arr(&[num("3"), num("1"), num("2")])]), "[1, 2, 3]");
        assert_eq!(render("sort", &[arr(&[text("C"), text("A"), text("B")])]), "[A, B, C]");
        assert_eq!(
            call("sort", &[arr(&[num("1"), arr(&[])])]),
            Value::error("error calling SORT: array isn't a comparable type")
        );
    }

    #[test]
    fn test_sum_and_unique() {
        assert_eq!(render("sum", &[arr(&[num("1"), num("2"), text("3")])]), "6");
        assert_eq!(render("sum", &[arr(&[])]), "0");
        assert_eq!(render("sum", &[arr(&[num("1"), text("x")])]), "ERROR");
        assert_eq!(render("unique", &[arr(&[num("1"), num("3"), num("2"), num("3")])]), "[1, 3, 2]");
        assert_eq!(render("unique", &[arr(&[text("hi"), text("there"), text("hi")])]), "[hi, there]");
        assert_eq!(render("unique", &[arr(&[num("1"), text("1")])]), "[1, 1]");
    }
}
