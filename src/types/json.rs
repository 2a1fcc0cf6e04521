//! JSON encoding and decoding of values

use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value as JsonValue};

use super::{number, Object, Value, XError};

/// Encode a value as compact JSON. Object keys are sorted.
pub fn to_json(value: &Value) -> Result<String, XError> {
    let json = to_json_value(value)?;
    serde_json::to_string(&json).map_err(|e| XError::new(format!("unable to encode JSON: {}", e)))
}

fn to_json_value(value: &Value) -> Result<JsonValue, XError> {
    Ok(match value {
        Value::Error(err) => return Err(err.clone()),
        Value::Null | Value::Function(_) => JsonValue::Null,
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Number(n) => {
            let number = Number::from_str(&number::render(n))
                .map_err(|e| XError::new(format!("unable to encode JSON: {}", e)))?;
            JsonValue::Number(number)
        }
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Date(_) | Value::DateTime(_) | Value::Time(_) => JsonValue::String(value.render()),
        Value::Array(array) => {
            JsonValue::Array(array.iter().map(to_json_value).collect::<Result<_, _>>()?)
        }
        Value::Object(object) => {
            let mut map = Map::new();
            for (key, value) in object.iter() {
                map.insert(key.clone(), to_json_value(value)?);
            }
            JsonValue::Object(map)
        }
    })
}

/// Decode JSON text into a value. Invalid JSON gives an error value.
pub fn from_json(text: &str) -> Value {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(json) => from_json_value(json),
        Err(e) => Value::error(format!("unable to parse JSON: {}", e)),
    }
}

fn from_json_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Number(n) => {
            let text = n.to_string();
            match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
                Ok(n) => Value::Number(n),
                Err(_) => Value::error("number value out of range"),
            }
        }
        JsonValue::Array(items) => Value::array(items.into_iter().map(from_json_value).collect()),
        JsonValue::Object(map) => {
            let properties: IndexMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, from_json_value(v)))
                .collect();
            Value::Object(Object::new(properties))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_json() {
        let object: Object = [
            ("foo", Value::from(1)),
            ("bar", Value::text("x")),
            ("list", Value::array(vec![Value::Boolean(true), Value::Null])),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            to_json(&Value::Object(object)).unwrap(),
            r#"{"bar":"x","foo":1,"list":[true,null]}"#
        );
        assert_eq!(to_json(&Value::Number(Decimal::new(12500, 3))).unwrap(), "12.5");
        assert_eq!(to_json(&Value::text("say \"hi\"")).unwrap(), r#""say \"hi\"""#);
        assert_eq!(to_json(&Value::error("boom")).unwrap_err().message(), "boom");
    }

    #[test]
    fn test_from_json() {
        let value = from_json(r#"{"name": "Bob", "age": 12.50, "tags": ["a"], "none": null}"#);
        let Value::Object(object) = &value else {
            panic!("expected object, got {:?}", value);
        };
        assert_eq!(object.get("name"), Some(&Value::text("Bob")));
        assert_eq!(object.get("age"), Some(&Value::Number(Decimal::new(125, 1))));
        assert_eq!(object.get("tags"), Some(&Value::array(vec![Value::text("a")])));
        assert_eq!(object.get("none"), Some(&Value::Null));

        assert_eq!(from_json("1e3"), Value::from(1000));
        assert!(from_json("{").is_error());
    }
}
