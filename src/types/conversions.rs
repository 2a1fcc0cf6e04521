//! Coercions between value types
//!
//! Each conversion hands back an error operand unchanged and otherwise fails
//! with `unable to convert <value> to a <type>`.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use super::{number, Array, Object, Value, XError, ZonedDateTime};
use crate::env::dates::{date_from_string, datetime_from_string, time_from_string};
use crate::env::Environment;

fn unable(value: &Value, target: &str) -> XError {
    XError::new(format!("unable to convert {} to {}", value.describe(), target))
}

/// Objects with a default convert through the default
fn object_default(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(object) => object.default_value(),
        _ => None,
    }
}

pub fn to_text(value: &Value) -> Result<String, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        other => Ok(other.render()),
    }
}

pub fn to_boolean(value: &Value) -> Result<bool, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        other => Ok(other.truthy()),
    }
}

pub fn to_number(value: &Value) -> Result<Decimal, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::Number(n) => Ok(*n),
        Value::Text(s) => number::parse_number(s).ok_or_else(|| unable(value, "a number")),
        other => match object_default(other) {
            Some(default) => to_number(default),
            None => Err(unable(other, "a number")),
        },
    }
}

pub fn to_integer(value: &Value) -> Result<i32, XError> {
    number::to_integer(to_number(value)?)
}

pub fn to_date(env: &Environment, value: &Value) -> Result<NaiveDate, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date()),
        Value::Text(s) => date_from_string(env, s).ok_or_else(|| unable(value, "a date")),
        other => match object_default(other) {
            Some(default) => to_date(env, default),
            None => Err(unable(other, "a date")),
        },
    }
}

pub fn to_datetime(env: &Environment, value: &Value) -> Result<ZonedDateTime, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::DateTime(dt) => Ok(dt.clone()),
        Value::Date(d) => Ok(ZonedDateTime::from_local(d.and_time(NaiveTime::MIN), env.timezone())),
        Value::Text(s) => datetime_from_string(env, s, false).ok_or_else(|| unable(value, "a datetime")),
        other => match object_default(other) {
            Some(default) => to_datetime(env, default),
            None => Err(unable(other, "a datetime")),
        },
    }
}

pub fn to_time(value: &Value) -> Result<NaiveTime, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::Time(t) => Ok(*t),
        Value::DateTime(dt) => Ok(dt.time()),
        Value::Number(n) if n.fract().is_zero() && *n >= Decimal::ZERO && *n <= Decimal::from(24) => {
            let hour = number::to_integer(*n)? as u32 % 24;
            NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| unable(value, "a time"))
        }
        Value::Text(s) => time_from_string(s).ok_or_else(|| unable(value, "a time")),
        other => match object_default(other) {
            Some(default) => to_time(default),
            None => Err(unable(other, "a time")),
        },
    }
}

pub fn to_array(value: &Value) -> Result<Array, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::Null => Ok(Array::default()),
        Value::Array(array) => Ok(array.clone()),
        other => match object_default(other) {
            Some(default) => to_array(default),
            None => Err(unable(other, "an array")),
        },
    }
}

pub fn to_object(value: &Value) -> Result<Object, XError> {
    match value {
        Value::Error(err) => Err(err.clone()),
        Value::Null => Ok(Object::default()),
        Value::Object(object) => Ok(object.clone()),
        other => Err(unable(other, "an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{DateFormat, FixedClock};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use std::sync::Arc;

    fn env() -> Environment {
        Environment::builder()
            .with_date_format(DateFormat::DayMonthYear)
            .with_timezone(chrono_tz::America::Guayaquil)
            .with_clock(Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2018, 4, 11, 18, 24, 30).unwrap(),
            )))
            .build()
    }

    fn num(s: &str) -> Value {
        Value::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_errors_pass_through() {
        let err = Value::error("boom");
        assert_eq!(to_text(&err).unwrap_err().message(), "boom");
        assert_eq!(to_number(&err).unwrap_err().message(), "boom");
        assert_eq!(to_date(&env(), &err).unwrap_err().message(), "boom");
        assert_eq!(to_array(&err).unwrap_err().message(), "boom");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::text(" 12.50 ")).unwrap(), Decimal::from_str("12.5").unwrap());
        assert_eq!(
            to_number(&Value::text("abc")).unwrap_err().message(),
            "unable to convert \"abc\" to a number"
        );
        assert_eq!(
            to_number(&Value::Null).unwrap_err().message(),
            "unable to convert null to a number"
        );
        assert_eq!(
            to_number(&Value::Boolean(true)).unwrap_err().message(),
            "unable to convert true to a number"
        );

        let with_default: Object = [("__default__", num("3"))].into_iter().collect();
        assert_eq!(to_number(&Value::Object(with_default)).unwrap(), Decimal::from(3));
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(&Value::text("12.7")).unwrap(), 12);
        assert_eq!(to_integer(&num("-3.2")).unwrap(), -3);
    }

    #[test]
    fn test_to_date_and_datetime() {
        let env = env();
        assert_eq!(
            to_date(&env, &Value::text("10/05/2010")).unwrap(),
            NaiveDate::from_ymd_opt(2010, 5, 10).unwrap()
        );
        assert_eq!(
            to_date(&env, &Value::text("nope")).unwrap_err().message(),
            "unable to convert \"nope\" to a date"
        );
        assert_eq!(
            to_datetime(&env, &Value::Date(NaiveDate::from_ymd_opt(2010, 5, 10).unwrap()))
                .unwrap()
                .to_string(),
            "2010-05-10T00:00:00.000000-05:00"
        );
        assert_eq!(
            to_datetime(&env, &Value::text("1979-07-18T15:00:00.000000Z"))
                .unwrap()
                .to_string(),
            "1979-07-18T15:00:00.000000Z"
        );
    }

    #[test]
    fn test_to_time() {
        assert_eq!(to_time(&num("13")).unwrap(), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(to_time(&num("24")).unwrap(), NaiveTime::MIN);
        assert_eq!(
            to_time(&Value::text("10:30:45 PM")).unwrap(),
            NaiveTime::from_hms_opt(22, 30, 45).unwrap()
        );
        assert_eq!(
            to_time(&num("25")).unwrap_err().message(),
            "unable to convert 25 to a time"
        );
    }

    #[test]
    fn test_to_array_and_object() {
        assert!(to_array(&Value::Null).unwrap().is_empty());
        assert_eq!(
            to_array(&Value::text("a")).unwrap_err().message(),
            "unable to convert \"a\" to an array"
        );
        assert!(to_object(&Value::Null).unwrap().is_empty());
        assert_eq!(
            to_object(&num("1")).unwrap_err().message(),
            "unable to convert 1 to an object"
        );
    }
}
