//! Conversion and JSON functions

use indexmap::IndexMap;

use super::wrappers::{min_args, one_arg, one_text};
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::conversions::{to_boolean, to_date, to_datetime, to_number, to_text, to_time};
use crate::types::json::{from_json, to_json};
use crate::types::{Object, Value, XError};

pub(super) fn register(r: &mut Registry) {
    r.add("text", one_arg(text));
    r.add("boolean", one_arg(boolean));
    r.add("number", one_arg(number));
    r.add("date", one_arg(date));
    r.add("datetime", one_arg(datetime));
    r.add("time", one_arg(time));
    r.add("array", min_args(0, array));
    r.add("object", min_args(0, object));

    r.add("json", one_arg(json));
    r.add("parse_json", one_text(parse_json));
}

/// `text(3.0)` -> `3`
fn text(_: &Environment, value: &Value) -> XResult {
    to_text(value).map(Value::Text)
}

fn boolean(_: &Environment, value: &Value) -> XResult {
    to_boolean(value).map(Value::Boolean)
}

fn number(_: &Environment, value: &Value) -> XResult {
    to_number(value).map(Value::Number)
}

fn date(env: &Environment, value: &Value) -> XResult {
    to_date(env, value).map(Value::Date)
}

fn datetime(env: &Environment, value: &Value) -> XResult {
    to_datetime(env, value).map(Value::DateTime)
}

fn time(_: &Environment, value: &Value) -> XResult {
    to_time(value).map(Value::Time)
}

/// Returns an array of the arguments, or the first argument that is an error
fn array(_: &Environment, values: &[Value]) -> XResult {
    if let Some(err) = values.iter().find_map(Value::as_error) {
        return Err(err.clone());
    }
    Ok(Value::array(values.to_vec()))
}

/// Builds an object from alternating keys and values
fn object(_: &Environment, pairs: &[Value]) -> XResult {
    if pairs.len() % 2 != 0 {
        return Err(XError::new("requires an even number of arguments"));
    }
    if let Some(err) = pairs.iter().find_map(Value::as_error) {
        return Err(err.clone());
    }

    let mut properties = IndexMap::with_capacity(pairs.len() / 2);
    for pair in pairs.chunks(2) {
        properties.insert(to_text(&pair[0])?, pair[1].clone());
    }
    Ok(Value::Object(Object::new(properties)))
}

fn json(_: &Environment, value: &Value) -> XResult {
    to_json(value).map(Value::Text)
}

fn parse_json(_: &Environment, text: String) -> XResult {
    match from_json(&text) {
        Value::Error(err) => Err(err),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conversions() {
        assert_eq!(render("text", &[num("3.0")]), "3");
        assert_eq!(render("boolean", &[text("FALSE")]), "false");
        assert_eq!(render("boolean", &[num("1")]), "true");
        assert_eq!(render("number", &[text("10.50")]), "10.5");
        assert_eq!(render("number", &[text("foo")]), "ERROR");
        assert_eq!(render("date", &[text("10/05/2010")]), "2010-05-10");
        assert_eq!(render("date", &[text("NOT DATE")]), "ERROR");
        assert_eq!(
            render("datetime", &[text("1979-07-18")]),
            "1979-07-18T00:00:00.000000-05:00"
        );
        assert_eq!(
            render("datetime", &[text("1979-07-18T10:30:45.123456Z")]),
            "1979-07-18T10:30:45.123456Z"
        );
        assert_eq!(render("time", &[text("10:30:45 PM")]), "22:30:45.000000");
        assert_eq!(render("time", &[num("10")]), "10:00:00.000000");
    }

    #[test]
    fn test_array_and_object() {
        assert_eq!(render("array", &[]), "[]");
        assert_eq!(render("array", &[text("a"), num("1")]), "[a, 1]");
        assert_eq!(
            call("array", &[text("a"), crate::types::Value::error("boom")]),
            crate::types::Value::error("error calling ARRAY: boom")
        );
        assert_eq!(
            render("object", &[text("a"), num("123"), text("b"), text("hello")]),
            "{a: 123, b: hello}"
        );
        assert_eq!(
            call("object", &[text("a")]),
            crate::types::Value::error("error calling OBJECT: requires an even number of arguments")
        );
    }

    #[test]
    fn test_json() {
        let obj = call("object", &[text("foo"), num("1"), text("bar"), text("x")]);
        assert_eq!(render("json", &[obj]), r#"{"bar":"x","foo":1}"#);
        assert_eq!(render("json", &[text("hello")]), r#""hello""#);
        assert_eq!(render("parse_json", &[text(r#"{"foo": [1, "x"]}"#)]), "{foo: [1, x]}");
        assert_eq!(render("parse_json", &[text("{")]), "ERROR");
    }
}
