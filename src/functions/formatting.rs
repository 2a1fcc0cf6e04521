//! Functions that turn values into human friendly text

use super::encoded::Urn;
use super::wrappers::{min_and_max_args, one_arg, one_text};
use super::{Registry, XResult};
use crate::env::dates::{Layout, LayoutMode};
use crate::env::{parse_timezone, Environment};
use crate::types::conversions::{to_boolean, to_date, to_datetime, to_integer, to_number, to_text, to_time};
use crate::types::{number, Value, XError};

pub(super) fn register(r: &mut Registry) {
    r.add("format", one_arg(format));
    r.add("format_date", min_and_max_args(1, 2, format_date));
    r.add("format_datetime", min_and_max_args(1, 3, format_datetime));
    r.add("format_time", min_and_max_args(1, 2, format_time));
    r.add("format_location", one_text(format_location));
    r.add("format_number", min_and_max_args(1, 3, format_number));
    r.add("format_urn", one_text(format_urn));
}

/// Formats any value using the environment's date, time and number formats
fn format(env: &Environment, value: &Value) -> XResult {
    match value {
        Value::Null => Ok(Value::text("")),
        Value::Error(err) => Err(err.clone()),
        other => Ok(Value::Text(other.format(env))),
    }
}

/// `format_date("1979-07-18T15:00:00.000000Z", "YYYY-MM-DD")` -> `1979-07-18`
fn format_date(env: &Environment, args: &[Value]) -> XResult {
    let date = to_date(env, &args[0])?;

    match args.get(1) {
        Some(format) => {
            let layout = Layout::new(&to_text(format)?, LayoutMode::Date)?;
            Ok(Value::Text(layout.format_date(date)))
        }
        None => Ok(Value::Text(Value::Date(date).format(env))),
    }
}

/// Formats in the given timezone, or the environment's one
fn format_datetime(env: &Environment, args: &[Value]) -> XResult {
    let datetime = to_datetime(env, &args[0])?;

    let format = match args.get(1) {
        Some(format) => to_text(format)?,
        None => format!("{} {}", env.date_format(), env.time_format()),
    };
    let tz = match args.get(2) {
        Some(name) => parse_timezone(&to_text(name)?).map_err(|e| XError::new(e.to_string()))?,
        None => env.timezone(),
    };

    let layout = Layout::new(&format, LayoutMode::DateTime)?;
    Ok(Value::Text(layout.format_datetime(&datetime.in_tz(tz))))
}

fn format_time(env: &Environment, args: &[Value]) -> XResult {
    let time = to_time(&args[0])?;

    match args.get(1) {
        Some(format) => {
            let layout = Layout::new(&to_text(format)?, LayoutMode::Time)?;
            Ok(Value::Text(layout.format_time(time)))
        }
        None => Ok(Value::Text(Value::Time(time).format(env))),
    }
}

/// The last part of a location path like `Rwanda > Kigali`
fn format_location(_: &Environment, path: String) -> XResult {
    let name = path.rsplit('>').next().unwrap_or_default().trim();
    Ok(Value::text(name))
}

/// `format_number(1234.5670, 2, true)` -> `1,234.57`
fn format_number(env: &Environment, args: &[Value]) -> XResult {
    let n = to_number(&args[0])?;

    let places = match args.get(1) {
        Some(arg) => {
            let places = to_integer(arg)?;
            if !(0..=9).contains(&places) {
                return Err(XError::new(format!(
                    "must take 0-9 number of places, got {}",
                    places
                )));
            }
            Some(places as u32)
        }
        None => None,
    };
    let humanize = match args.get(2) {
        Some(arg) => to_boolean(arg)?,
        None => true,
    };

    Ok(Value::Text(number::format(&n, env.number_format(), places, humanize)))
}

/// The display part of a URN, or its path
fn format_urn(_: &Environment, urn: String) -> XResult {
    let urn = Urn::parse(&urn)?;
    Ok(Value::text(urn.format()))
}
