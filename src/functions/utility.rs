//! Logic, lookup and higher-order functions

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::wrappers::{min_args, one_arg, one_text, three_args, two_args};
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::conversions::{to_array, to_boolean, to_datetime, to_number, to_object, to_text};
use crate::types::{number, Function, Object, Value, XError, ZonedDateTime};

pub(super) fn register(r: &mut Registry) {
    r.add("and", min_args(1, and));
    r.add("or", min_args(1, or));
    r.add("if", three_args(if_));
    r.add("is_error", one_arg(is_error));
    r.add("count", one_arg(count));
    r.add("default", two_args(default));
    r.add("extract", two_args(extract));
    r.add("extract_object", min_args(2, extract_object));
    r.add("foreach", min_args(2, foreach));
    r.add("foreach_value", min_args(2, foreach_value));
    r.add("legacy_add", two_args(legacy_add));
    r.add("read_chars", one_text(read_chars));
}

fn and(_: &Environment, args: &[Value]) -> XResult {
    for arg in args {
        if !to_boolean(arg)? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn or(_: &Environment, args: &[Value]) -> XResult {
    for arg in args {
        if to_boolean(arg)? {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

/// `if(test, value_if_true, value_if_false)`. Both branches are already
/// evaluated, only the test is coerced.
fn if_(_: &Environment, test: &Value, if_true: &Value, if_false: &Value) -> XResult {
    Ok(if to_boolean(test)? {
        if_true.clone()
    } else {
        if_false.clone()
    })
}

fn is_error(_: &Environment, value: &Value) -> XResult {
    Ok(Value::Boolean(value.is_error()))
}

fn count(_: &Environment, value: &Value) -> XResult {
    match value {
        Value::Null => Ok(Value::from(0)),
        Value::Error(err) => Err(err.clone()),
        other => other
            .count()
            .map(|n| Value::from(n as i64))
            .ok_or_else(|| XError::new("value isn't countable")),
    }
}

/// The value, or `fallback` when it's an error or empty
fn default(_: &Environment, value: &Value, fallback: &Value) -> XResult {
    match to_text(value) {
        Ok(text) if !text.is_empty() => Ok(value.clone()),
        _ => Ok(fallback.clone()),
    }
}

/// `extract(contact, "name")`, giving null if the property doesn't exist
fn extract(_: &Environment, object: &Value, key: &Value) -> XResult {
    let object = to_object(object)?;
    let key = to_text(key)?;
    Ok(object.get(&key).cloned().unwrap_or_default())
}

/// A new object with only the given properties of another
fn extract_object(_: &Environment, args: &[Value]) -> XResult {
    let object = to_object(&args[0])?;

    let mut properties = IndexMap::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        let key = to_text(arg)?;
        let value = object.get(&key).cloned().unwrap_or_default();
        properties.insert(key, value);
    }
    Ok(Value::Object(Object::new(properties)))
}

fn function_arg(value: &Value) -> Result<&Function, XError> {
    match value {
        Value::Function(f) => Ok(f),
        Value::Error(err) => Err(err.clone()),
        _ => Err(XError::new("requires an function as its second argument")),
    }
}

/// Calls `func` with each item of an array, plus any extra arguments
fn foreach(env: &Environment, args: &[Value]) -> XResult {
    let array = to_array(&args[0])?;
    let func = function_arg(&args[1])?;
    let extra = &args[2..];

    let mut results = Vec::with_capacity(array.len());
    for item in &array {
        let mut call_args = Vec::with_capacity(extra.len() + 1);
        call_args.push(item.clone());
        call_args.extend_from_slice(extra);

        let result = func.call(env, &call_args);
        if result.is_error() {
            return Ok(result);
        }
        results.push(result);
    }
    Ok(Value::array(results))
}

/// Like `foreach` but over the values of an object, keeping its keys
fn foreach_value(env: &Environment, args: &[Value]) -> XResult {
    let object = to_object(&args[0])?;
    let func = function_arg(&args[1])?;
    let extra = &args[2..];

    let mut properties = IndexMap::with_capacity(object.len());
    for (key, value) in object.iter() {
        let mut call_args = Vec::with_capacity(extra.len() + 1);
        call_args.push(value.clone());
        call_args.extend_from_slice(extra);

        let result = func.call(env, &call_args);
        if result.is_error() {
            return Ok(result);
        }
        properties.insert(key.clone(), result);
    }
    Ok(Value::Object(Object::new(properties)))
}

/// Old style `+` where one side may be a date and the other a number of days
fn legacy_add(env: &Environment, arg1: &Value, arg2: &Value) -> XResult {
    let date1 = to_datetime(env, arg1);
    let date2 = to_datetime(env, arg2);
    let dec1 = to_number(arg1);
    let dec2 = to_number(arg2);

    if date1.is_ok() && date2.is_ok() {
        return Err(XError::new("cannot operate on two dates"));
    }
    if let (Ok(date), Ok(days)) = (&date1, &dec2) {
        return add_days(date, *days);
    }
    if let (Ok(date), Ok(days)) = (&date2, &dec1) {
        return add_days(date, *days);
    }

    Ok(Value::Number(number::add(dec1?, dec2?)?))
}

fn add_days(date: &ZonedDateTime, days: Decimal) -> XResult {
    let days = days
        .trunc()
        .to_i32()
        .ok_or_else(|| XError::new("cannot operate on integers greater than 32 bit"))?;

    date.add_date(0, 0, days as i64)
        .map(Value::DateTime)
        .ok_or_else(|| XError::new("date value out of range"))
}

/// Spaces out digits for text to speech, e.g. `+123456` -> `1 2 3 , 4 5 6`
fn read_chars(_: &Environment, text: String) -> XResult {
    let chars: Vec<String> = text.trim_start_matches('+').chars().map(String::from).collect();

    let grouped = |size: usize| {
        chars
            .chunks(size)
            .map(|group| group.join(" "))
            .collect::<Vec<_>>()
            .join(" , ")
    };

    let spoken = if !chars.is_empty() && chars.len() % 3 == 0 {
        grouped(3)
    } else if !chars.is_empty() && chars.len() % 4 == 0 {
        grouped(4)
    } else {
        chars.join(" , ")
    };
    Ok(Value::Text(spoken))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(pairs.iter().map(|(k, v)| (*k, v.clone())).collect())
    }

    #[test]
    fn test_and_or() {
        assert_eq!(call("and", &[Value::Boolean(true), text("yes")]), Value::Boolean(true));
        assert_eq!(call("and", &[Value::Boolean(true), num("0")]), Value::Boolean(false));
        assert_eq!(call("or", &[Value::Boolean(false), text("")]), Value::Boolean(false));
        assert_eq!(call("or", &[Value::Boolean(false), text("x")]), Value::Boolean(true));
        assert_eq!(render("and", &[Value::Boolean(true), Value::error("x")]), "ERROR");
        assert_eq!(render("or", &[]), "ERROR");
    }

    #[test]
    fn test_if() {
        assert_eq!(call("if", &[Value::Boolean(true), text("10"), text("20")]), text("10"));
        assert_eq!(call("if", &[Value::Boolean(false), text("10"), text("20")]), text("20"));
        assert_eq!(call("if", &[text(""), text("10"), text("20")]), text("20"));
        assert_eq!(
            call("if", &[text("x"), Value::error("a"), text("20")]),
            Value::error("error calling IF: a")
        );
        assert_eq!(
            call("if", &[Value::error("bad"), text("10"), text("20")]),
            Value::error("error calling IF: bad")
        );
        assert_eq!(render("if", &[Value::Boolean(true), text("10")]), "ERROR");
    }

    #[test]
    fn test_is_error_and_count() {
        assert_eq!(call("is_error", &[Value::error("x")]), Value::Boolean(true));
        assert_eq!(call("is_error", &[text("x")]), Value::Boolean(false));
        assert_eq!(call("is_error", &[Value::Null]), Value::Boolean(false));

        assert_eq!(render("count", &[Value::array(vec![num("1"), num("2")])]), "2");
        assert_eq!(render("count", &[obj(&[("a", num("1"))])]), "1");
        assert_eq!(render("count", &[Value::Null]), "0");
        assert_eq!(
            call("count", &[text("abc")]),
            Value::error("error calling COUNT: value isn't countable")
        );
        assert_eq!(render("count", &[Value::error("x")]), "ERROR");
    }

    #[test]
    fn test_default() {
        assert_eq!(call("default", &[text("10"), text("20")]), text("10"));
        assert_eq!(call("default", &[Value::Null, text("20")]), text("20"));
        assert_eq!(call("default", &[text(""), text("20")]), text("20"));
        assert_eq!(call("default", &[Value::error("x"), text("20")]), text("20"));
        assert_eq!(call("default", &[num("0"), text("20")]), num("0"));
    }

    #[test]
    fn test_extract() {
        let contact = obj(&[("name", text("Bob")), ("age", num("33"))]);
        assert_eq!(call("extract", &[contact.clone(), text("name")]), text("Bob"));
        assert_eq!(call("extract", &[contact.clone(), text("Name")]), Value::Null);
        assert_eq!(call("extract", &[Value::Null, text("name")]), Value::Null);
        assert_eq!(render("extract", &[text("abc"), text("name")]), "ERROR");

        assert_eq!(
            render("extract_object", &[contact.clone(), text("name"), text("city")]),
            "{city: , name: Bob}"
        );
        assert_eq!(render("extract_object", &[contact]), "ERROR");
    }

    #[test]
    fn test_foreach() {
        let upper = crate::functions::lookup("upper").map(Value::Function).unwrap();
        let items = Value::array(vec![text("a"), text("b")]);

        assert_eq!(render("foreach", &[items.clone(), upper.clone()]), "[A, B]");
        assert_eq!(render("foreach", &[Value::array(vec![]), upper.clone()]), "[]");
        assert_eq!(
            call("foreach", &[items.clone(), text("upper")]),
            Value::error("error calling FOREACH: requires an function as its second argument")
        );
        assert_eq!(render("foreach", &[items.clone(), Value::error("x")]), "ERROR");

        let repeat = crate::functions::lookup("repeat").map(Value::Function).unwrap();
        assert_eq!(render("foreach", &[items.clone(), repeat.clone(), num("2")]), "[aa, bb]");
        assert_eq!(
            call("foreach", &[items, repeat, num("-1")]),
            Value::error("error calling FOREACH: error calling REPEAT: must be called with a positive integer, got -1")
        );
    }

    #[test]
    fn test_foreach_value() {
        let upper = crate::functions::lookup("upper").map(Value::Function).unwrap();
        let object = obj(&[("z", text("x")), ("a", text("y"))]);

        let Value::Object(result) = call("foreach_value", &[object, upper]) else {
            panic!("foreach_value should return an object");
        };
        let keys: Vec<&str> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(result.get("z"), Some(&text("X")));
    }

    #[test]
    fn test_legacy_add() {
        assert_eq!(render("legacy_add", &[num("1"), num("2")]), "3");
        assert_eq!(render("legacy_add", &[text("1.5"), num("2")]), "3.5");
        assert_eq!(
            render("legacy_add", &[text("01-12-2017"), num("2")]),
            "2017-12-03T00:00:00.000000-05:00"
        );
        assert_eq!(
            render("legacy_add", &[num("-2"), text("01-12-2017")]),
            "2017-11-29T00:00:00.000000-05:00"
        );
        assert_eq!(
            call("legacy_add", &[text("01-12-2017"), text("02-12-2017")]),
            Value::error("error calling LEGACY_ADD: cannot operate on two dates")
        );
        assert_eq!(
            call("legacy_add", &[text("01-12-2017"), num("2147483648")]),
            Value::error("error calling LEGACY_ADD: cannot operate on integers greater than 32 bit")
        );
        assert_eq!(render("legacy_add", &[text("abc"), num("2")]), "ERROR");
    }

    #[test]
    fn test_read_chars() {
        assert_eq!(render("read_chars", &[text("123456")]), "1 2 3 , 4 5 6");
        assert_eq!(render("read_chars", &[text("+123456")]), "1 2 3 , 4 5 6");
        assert_eq!(render("read_chars", &[text("12345678")]), "1 2 3 4 , 5 6 7 8");
        assert_eq!(render("read_chars", &[text("12")]), "1 , 2");
        assert_eq!(render("read_chars", &[text("abcd")]), "a b c d");
        assert_eq!(render("read_chars", &[text("")]), "");
    }
}
