//! The value model
//!
//! Every expression evaluates to a [`Value`]. Evaluation failures are values
//! too ([`Value::Error`]) so they can be stored, passed to functions and tested.

pub mod conversions;
pub mod datetime;
pub mod json;
pub mod number;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::env::dates::{Layout, LayoutMode};
use crate::env::Environment;

pub use datetime::ZonedDateTime;

/// An evaluation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct XError {
    message: String,
}

impl XError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Signature of native function implementations
pub type NativeFunction = dyn Fn(&Environment, &[Value]) -> Value + Send + Sync;

/// A callable value, either a registered function or an anonymous function
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    call: Arc<NativeFunction>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&Environment, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            call: Arc::new(call),
        }
    }

    pub fn anonymous<F>(call: F) -> Self
    where
        F: Fn(&Environment, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: None,
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Call this function. Errors returned by a named function are prefixed
    /// with its upper-cased name.
    pub fn call(&self, env: &Environment, args: &[Value]) -> Value {
        let result = (self.call)(env, args);
        match (&self.name, result) {
            (Some(name), Value::Error(err)) => Value::error(format!(
                "error calling {}: {}",
                name.to_uppercase(),
                err.message()
            )),
            (_, result) => result,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Function({})", name),
            None => f.write_str("Function(<anonymous>)"),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

/// An immutable, cheaply cloned sequence of values
#[derive(Clone, Default, PartialEq)]
pub struct Array(Arc<Vec<Value>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn items(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default)]
struct ObjectData {
    default: Option<Value>,
    properties: IndexMap<String, Value>,
    /// Deprecation messages by property name
    deprecated: IndexMap<String, String>,
}

/// An immutable, cheaply cloned set of named properties.
///
/// Properties keep their insertion order. A property named `__default__` is
/// split out as the object's default, which stands in for the object when it
/// is rendered, compared or tested for truthiness.
#[derive(Clone, Default)]
pub struct Object(Arc<ObjectData>);

impl Object {
    pub const DEFAULT_KEY: &'static str = "__default__";

    pub fn new(mut properties: IndexMap<String, Value>) -> Self {
        let default = properties.shift_remove(Self::DEFAULT_KEY);
        Self(Arc::new(ObjectData {
            default,
            properties,
            deprecated: IndexMap::new(),
        }))
    }

    pub fn with_default(default: Value, properties: IndexMap<String, Value>) -> Self {
        let mut object = Self::new(properties);
        if let Some(data) = Arc::get_mut(&mut object.0) {
            data.default = Some(default);
        }
        object
    }

    /// Mark a property as deprecated. Expressions can still read it, but
    /// doing so adds a warning carrying `message`.
    pub fn deprecate(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.0).deprecated.insert(key.into(), message.into());
        self
    }

    /// The deprecation message for a property, if it has one
    pub fn deprecation(&self, key: &str) -> Option<&str> {
        self.0.deprecated.get(key).map(String::as_str)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.0.default.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.properties.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.properties.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.properties.iter()
    }

    /// Property names in sorted order, as used for display
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        if let Some(default) = &self.0.default {
            map.entry(&Self::DEFAULT_KEY, default);
        }
        map.entries(self.0.properties.iter()).finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.default == other.0.default
            && self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A value produced by evaluating an expression
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(ZonedDateTime),
    Time(NaiveTime),
    Array(Array),
    Object(Object),
    Function(Function),
    Error(XError),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(XError::new(message))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_error(&self) -> Option<&XError> {
        match self {
            Value::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Error(_) => "error",
        }
    }

    /// Short description used in error messages, e.g. `"abc"`, `12` or `array`
    pub fn describe(&self) -> String {
        match self {
            Value::Text(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s)),
            Value::Number(n) => number::render(n),
            Value::Boolean(b) => b.to_string(),
            other => other.type_name().to_string(),
        }
    }

    /// Canonical text form of this value
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => number::render(n),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.to_string(),
            Value::Time(t) => datetime::format_time(*t),
            Value::Array(array) => {
                let parts: Vec<String> = array.iter().map(Value::render).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(object) => match object.default_value() {
                Some(default) => default.render(),
                None => {
                    let pairs: Vec<String> = object
                        .sorted_keys()
                        .into_iter()
                        .map(|k| format!("{}: {}", k, object.get(k).map(Value::render).unwrap_or_default()))
                        .collect();
                    format!("{{{}}}", pairs.join(", "))
                }
            },
            Value::Function(_) => "function".to_string(),
            Value::Error(err) => err.message().to_string(),
        }
    }

    /// Human friendly text form of this value, using the environment's formats
    pub fn format(&self, env: &Environment) -> String {
        match self {
            Value::Number(n) => number::format(n, env.number_format(), None, true),
            Value::Date(d) => match Layout::new(env.date_format().as_str(), LayoutMode::Date) {
                Ok(layout) => layout.format_date(*d),
                Err(_) => self.render(),
            },
            Value::DateTime(dt) => {
                let format = format!("{} {}", env.date_format(), env.time_format());
                match Layout::new(&format, LayoutMode::DateTime) {
                    Ok(layout) => layout.format_datetime(&dt.in_tz(env.timezone())),
                    Err(_) => self.render(),
                }
            }
            Value::Time(t) => match Layout::new(env.time_format().as_str(), LayoutMode::Time) {
                Ok(layout) => layout.format_time(*t),
                Err(_) => self.render(),
            },
            Value::Array(array) => {
                let parts: Vec<String> = array.iter().map(|v| v.format(env)).collect();
                if parts.iter().any(|p| p.contains('\n')) {
                    parts
                        .iter()
                        .map(|p| format!("-{}", &indent(p, "  ")[1..]))
                        .collect::<Vec<_>>()
                        .join("\n")
                } else {
                    parts.join(", ")
                }
            }
            Value::Object(object) => match object.default_value() {
                Some(default) => default.format(env),
                None => object
                    .sorted_keys()
                    .into_iter()
                    .map(|k| {
                        let formatted = object.get(k).map(|v| v.format(env)).unwrap_or_default();
                        if formatted.contains('\n') {
                            format!("{}:\n{}", k, indent(&formatted, "  "))
                        } else {
                            format!("{}: {}", k, formatted)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            other => other.render(),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Null | Value::Error(_) => false,
            Value::Text(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            Value::Number(n) => !n.is_zero(),
            Value::Boolean(b) => *b,
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Function(_) => true,
            Value::Array(array) => !array.is_empty(),
            Value::Object(object) => match object.default_value() {
                Some(default) => default.truthy(),
                None => !object.is_empty(),
            },
        }
    }

    /// Number of items in an array or properties in an object
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::Array(array) => Some(array.len()),
            Value::Object(object) => Some(object.len()),
            _ => None,
        }
    }

    /// Order two values for sorting. Text sorts lexically, other scalars by
    /// value, and values of different types by type.
    pub fn compare(&self, other: &Value) -> Result<Ordering, XError> {
        let rank = |v: &Value| -> Result<u8, XError> {
            match v {
                Value::Boolean(_) => Ok(0),
                Value::Number(_) => Ok(1),
                Value::Text(_) => Ok(2),
                Value::Date(_) => Ok(3),
                Value::DateTime(_) => Ok(4),
                Value::Time(_) => Ok(5),
                other => Err(XError::new(format!("{} isn't a comparable type", other.describe()))),
            }
        };

        let (a, b) = (rank(self)?, rank(other)?);
        Ok(match (self, other) {
            (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => x.cmp(y),
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            (Value::Date(x), Value::Date(y)) => x.cmp(y),
            (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
            (Value::Time(x), Value::Time(y)) => x.cmp(y),
            _ => a.cmp(&b),
        })
    }
}

/// Type and value equality. Numbers compare by value, datetimes by instant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<XError> for Value {
    fn from(err: XError) -> Self {
        Value::Error(err)
    }
}

impl From<Result<Value, XError>> for Value {
    fn from(result: Result<Value, XError>) -> Self {
        result.unwrap_or_else(Value::Error)
    }
}

/// Prefix every line of `text` with `prefix`
fn indent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn num(s: &str) -> Value {
        Value::Number(Decimal::from_str(s).unwrap())
    }

    fn object(pairs: &[(&str, Value)]) -> Value {
        Value::Object(pairs.iter().cloned().collect())
    }

    fn env() -> Environment {
        Environment::builder()
            .with_date_format(crate::env::DateFormat::DayMonthYear)
            .with_timezone(chrono_tz::America::Guayaquil)
            .build()
    }

    #[test]
    fn test_describe() {
        assert_eq!(Value::text("abc").describe(), "\"abc\"");
        assert_eq!(num("12.50").describe(), "12.5");
        assert_eq!(Value::Boolean(true).describe(), "true");
        assert_eq!(Value::array(vec![]).describe(), "array");
        assert_eq!(object(&[]).describe(), "object");
        assert_eq!(Value::Null.describe(), "null");
    }

    #[test]
    fn test_render() {
        assert_eq!(num("123.0").render(), "123");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(
            Value::array(vec![Value::text("a"), num("1"), Value::Boolean(false)]).render(),
            "[a, 1, false]"
        );
        assert_eq!(
            object(&[("foo", num("1")), ("bar", Value::text("x"))]).render(),
            "{bar: x, foo: 1}"
        );
        assert_eq!(
            object(&[("__default__", Value::text("Ryan")), ("age", num("23"))]).render(),
            "Ryan"
        );
        assert_eq!(
            Value::Time(NaiveTime::from_hms_opt(8, 10, 0).unwrap()).render(),
            "08:10:00.000000"
        );
    }

    #[test]
    fn test_format() {
        let env = env();
        assert_eq!(num("1234.5670").format(&env), "1,234.567");
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2018, 4, 11).unwrap()).format(&env),
            "11-04-2018"
        );
        assert_eq!(
            Value::array(vec![Value::text("a"), Value::text("b")]).format(&env),
            "a, b"
        );

        let nested = object(&[
            ("name", Value::text("Bob")),
            ("address", object(&[("city", Value::text("Kigali")), ("zip", num("1234"))])),
        ]);
        assert_eq!(
            nested.format(&env),
            "address:\n  city: Kigali\n  zip: 1,234\nname: Bob"
        );

        let list = Value::array(vec![
            object(&[("a", num("1")), ("b", num("2"))]),
            object(&[("a", num("3")), ("b", num("4"))]),
        ]);
        assert_eq!(list.format(&env), "- a: 1\n  b: 2\n- a: 3\n  b: 4");
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Null.truthy());
        assert!(!Value::text("").truthy());
        assert!(!Value::text("FALSE").truthy());
        assert!(Value::text("no").truthy());
        assert!(!num("0.00").truthy());
        assert!(num("-1").truthy());
        assert!(!Value::array(vec![]).truthy());
        assert!(!object(&[]).truthy());
        assert!(!object(&[("__default__", Value::text(""))]).truthy());
        assert!(!Value::error("boom").truthy());
    }

    #[test]
    fn test_equality() {
        assert_eq!(num("1.0"), num("1"));
        assert_ne!(num("1"), Value::text("1"));
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::text(""));
        assert_eq!(
            object(&[("a", num("1")), ("b", num("2"))]),
            object(&[("b", num("2.00")), ("a", num("1"))])
        );
        assert_ne!(
            Value::array(vec![num("1"), num("2")]),
            Value::array(vec![num("2"), num("1")])
        );
    }

    #[test]
    fn test_compare() {
        assert_eq!(num("2").compare(&num("10")).unwrap(), Ordering::Less);
        assert_eq!(Value::text("b").compare(&Value::text("a")).unwrap(), Ordering::Greater);
        assert_eq!(
            Value::array(vec![]).compare(&num("1")).unwrap_err().message(),
            "array isn't a comparable type"
        );
    }

    #[test]
    fn test_function_call_prefixes_errors() {
        let env = env();
        let named = Function::new("upper", |_, _| Value::error("boom"));
        assert_eq!(named.call(&env, &[]), Value::error("error calling UPPER: boom"));

        let anon = Function::anonymous(|_, _| Value::error("boom"));
        assert_eq!(anon.call(&env, &[]), Value::error("boom"));
        assert_eq!(named, named.clone());
        assert_ne!(named, anon);
    }

    #[test]
    fn test_object_default_split() {
        let obj: Object = [("__default__", Value::text("x")), ("a", num("1"))].into_iter().collect();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get("__default__"), None);
        assert_eq!(obj.default_value(), Some(&Value::text("x")));
    }

    #[test]
    fn test_object_deprecation() {
        let plain: Object = [("foo", Value::text("abc")), ("dep", Value::text("old"))].into_iter().collect();
        let obj = plain.clone().deprecate("dep", "don't use this");

        assert_eq!(obj.deprecation("dep"), Some("don't use this"));
        assert_eq!(obj.deprecation("foo"), None);
        assert_eq!(plain.deprecation("dep"), None);
        assert_eq!(obj.get("dep"), Some(&Value::text("old")));
        // deprecation doesn't affect equality
        assert_eq!(obj, plain);
    }
}
