//! Date, time and datetime functions

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::wrappers::{min_and_max_args, no_args, one_date, one_datetime, one_number, three_args, three_integer, two_args};
use super::{Registry, XResult};
use crate::env::dates::{Layout, LayoutMode};
use crate::env::{parse_timezone, Environment};
use crate::types::conversions::{to_datetime, to_integer, to_text, to_time};
use crate::types::datetime::{date_from_parts as build_date, days_between, format_offset, months_between, week_number as week_of_year};
use crate::types::{number, Value, XError, ZonedDateTime};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

pub(super) fn register(r: &mut Registry) {
    r.add("parse_datetime", min_and_max_args(2, 3, parse_datetime));
    r.add("datetime_from_epoch", one_number(datetime_from_epoch));
    r.add("datetime_diff", three_args(datetime_diff));
    r.add("datetime_add", three_args(datetime_add));
    r.add("replace_time", two_args(replace_time));
    r.add("tz", one_datetime(tz));
    r.add("tz_offset", one_datetime(tz_offset));
    r.add("now", no_args(now));
    r.add("epoch", one_datetime(epoch));

    r.add("date_from_parts", three_integer(date_from_parts));
    r.add("weekday", one_date(weekday));
    r.add("week_number", one_date(week_number));
    r.add("today", no_args(today));

    r.add("parse_time", two_args(parse_time));
    r.add("time_from_parts", three_integer(time_from_parts));
}

fn out_of_range() -> XError {
    XError::new("date value out of range")
}

fn unknown_unit(unit: &str) -> XError {
    XError::new(format!("unknown unit: {}, must be one of s, m, h, D, W, M, Y", unit))
}

/// `parse_datetime("15/06/2017 14:30", "DD/MM/YYYY tt:mm", "America/Los_Angeles")`
fn parse_datetime(env: &Environment, args: &[Value]) -> XResult {
    let text = to_text(&args[0])?;
    let format = to_text(&args[1])?;

    let tz = match args.get(2) {
        Some(arg) => parse_timezone(&to_text(arg)?).map_err(|e| XError::new(e.to_string()))?,
        None => env.timezone(),
    };

    let layout = Layout::new(&format, LayoutMode::DateTime)?;
    layout.parse_datetime(&text, tz).map(Value::DateTime)
}

/// Seconds since the UNIX epoch, which may be fractional, as a datetime in
/// the environment's timezone
fn datetime_from_epoch(env: &Environment, seconds: Decimal) -> XResult {
    let nanos = number::mul(seconds, Decimal::from(NANOS_PER_SECOND))?
        .trunc()
        .to_i64()
        .ok_or_else(out_of_range)?;
    Ok(Value::DateTime(ZonedDateTime::from_timestamp_nanos(nanos, env.timezone())))
}

/// Whole units from the first datetime to the second. Seconds, minutes and
/// hours count elapsed time while days and above count calendar boundaries.
fn datetime_diff(env: &Environment, arg1: &Value, arg2: &Value, arg3: &Value) -> XResult {
    let date1 = to_datetime(env, arg1)?;
    let date2 = to_datetime(env, arg2)?;
    let unit = to_text(arg3)?;

    let elapsed = date2.instant() - date1.instant();

    let diff = match unit.as_str() {
        "s" => elapsed.num_seconds(),
        "m" => elapsed.num_minutes(),
        "h" => elapsed.num_hours(),
        "D" => days_between(date1.date(), date2.date()),
        "W" => days_between(date1.date(), date2.date()) / 7,
        "M" => months_between(date1.date(), date2.date()),
        "Y" => (date2.date().year() - date1.date().year()) as i64,
        _ => return Err(unknown_unit(&unit)),
    };
    Ok(Value::from(diff))
}

/// `datetime_add("2017-01-15", 5, "D")` -> `2017-01-20T00:00:00.000000-05:00`
fn datetime_add(env: &Environment, arg1: &Value, arg2: &Value, arg3: &Value) -> XResult {
    let datetime = to_datetime(env, arg1)?;
    let offset = to_integer(arg2)?;
    let unit = to_text(arg3)?;

    let added = match unit.as_str() {
        "s" => datetime.add_duration(TimeDelta::seconds(offset as i64)),
        "m" => datetime.add_duration(TimeDelta::minutes(offset as i64)),
        "h" => datetime.add_duration(TimeDelta::hours(offset as i64)),
        "D" => datetime.add_date(0, 0, offset as i64),
        "W" => datetime.add_date(0, 0, offset as i64 * 7),
        "M" => datetime.add_date(0, offset, 0),
        "Y" => datetime.add_date(offset, 0, 0),
        _ => return Err(unknown_unit(&unit)),
    };
    added.map(Value::DateTime).ok_or_else(out_of_range)
}

fn replace_time(env: &Environment, arg1: &Value, arg2: &Value) -> XResult {
    let datetime = to_datetime(env, arg1)?;
    let time = to_time(arg2)?;
    Ok(Value::DateTime(datetime.replace_time(time)))
}

/// Name of the datetime's timezone, e.g. `America/Guayaquil`
fn tz(_: &Environment, datetime: ZonedDateTime) -> XResult {
    Ok(Value::Text(datetime.zone_name()))
}

/// Offset of the datetime's timezone, e.g. `-0500`
fn tz_offset(_: &Environment, datetime: ZonedDateTime) -> XResult {
    Ok(Value::Text(format_offset(datetime.offset_seconds(), false, false)))
}

fn now(env: &Environment) -> XResult {
    Ok(Value::DateTime(ZonedDateTime::from_tz(env.now())))
}

/// Seconds since the UNIX epoch, including any fraction
fn epoch(_: &Environment, datetime: ZonedDateTime) -> XResult {
    let nanos = datetime.timestamp_nanos().ok_or_else(out_of_range)?;
    number::div(Decimal::from(nanos), Decimal::from(NANOS_PER_SECOND)).map(Value::Number)
}

/// Days past the end of the month roll over, so February 31st is in March
fn date_from_parts(_: &Environment, year: i32, month: i32, day: i32) -> XResult {
    if !(1..=12).contains(&month) {
        return Err(XError::new("invalid value for month, must be 1-12"));
    }
    build_date(year, month as u32, day as i64)
        .map(Value::Date)
        .ok_or_else(out_of_range)
}

/// Day of the week, where Sunday is 0
fn weekday(_: &Environment, date: NaiveDate) -> XResult {
    Ok(Value::from(date.weekday().num_days_from_sunday() as i64))
}

fn week_number(_: &Environment, date: NaiveDate) -> XResult {
    Ok(Value::from(week_of_year(date) as i64))
}

fn today(env: &Environment) -> XResult {
    Ok(Value::Date(env.now().date_naive()))
}

fn parse_time(_: &Environment, arg1: &Value, arg2: &Value) -> XResult {
    let text = to_text(arg1)?;
    let format = to_text(arg2)?;

    let layout = Layout::new(&format, LayoutMode::Time)?;
    layout.parse_time(&text).map(Value::Time)
}

fn time_from_parts(_: &Environment, hour: i32, minute: i32, second: i32) -> XResult {
    if !(0..=23).contains(&hour) {
        return Err(XError::new("invalid value for hour, must be 0-23"));
    }
    if !(0..=59).contains(&minute) {
        return Err(XError::new("invalid value for minute, must be 0-59"));
    }
    if !(0..=59).contains(&second) {
        return Err(XError::new("invalid value for second, must be 0-59"));
    }

    NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
        .map(Value::Time)
        .ok_or_else(out_of_range)
}
