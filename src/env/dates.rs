//! Parsing and formatting of dates and times
//!
//! Two kinds of parsing live here: lenient extraction of dates and times from
//! human-entered text (driven by the environment's date format), and strict
//! parsing against a [`Layout`] such as `YYYY-MM-DD tt:mm`.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike,
};
use chrono_tz::Tz;
use regex::Regex;

use super::{DateFormat, Environment};
use crate::types::datetime::{date_from_parts, format_offset, time_from_parts, ZonedDateTime};
use crate::types::XError;

static PATTERN_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2})[-.\\/_ ]([0-9]{1,2})[-.\\/_ ]([0-9]{4}|[0-9]{2})\b")
        .expect("valid regex")
});

static PATTERN_YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{4}|[0-9]{2})[-.\\/_ ]([0-9]{1,2})[-.\\/_ ]([0-9]{1,2})\b")
        .expect("valid regex")
});

static PATTERN_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2})(?:(?::)?([0-9]{2})(?::([0-9]{2})(?:\.([0-9]+))?)?)?\W*([aApP][mM])?\b")
        .expect("valid regex")
});

/// ISO-8601 forms tried before anything else
static ISO_LAYOUTS: LazyLock<Vec<Layout>> = LazyLock::new(|| {
    ["YYYY-MM-DDTtt:mm:ssZ", "YYYY-MM-DDTtt:mmZ"]
        .iter()
        .filter_map(|f| Layout::new(f, LayoutMode::DateTime).ok())
        .collect()
});

static ISO_DATE_LAYOUT: LazyLock<Option<Layout>> =
    LazyLock::new(|| Layout::new("YYYY-MM-DD", LayoutMode::Date).ok());

const ISO_DATE_LENGTH: usize = 10;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const TRIM_CHARS: &[char] = &[' ', '\n', '\r', '\t'];

/// Extract a datetime from human-entered text.
///
/// ISO-8601 datetimes are tried first. Otherwise a date is located using the
/// environment's date format, and a time is looked for in the text after it.
/// Without a time, `fill_time` takes the current time of day, else midnight.
pub fn datetime_from_string(env: &Environment, text: &str, fill_time: bool) -> Option<ZonedDateTime> {
    let text = text.trim_matches(TRIM_CHARS);
    let tz = env.timezone();

    for layout in ISO_LAYOUTS.iter() {
        if let Ok(parsed) = layout.parse_datetime(text, tz) {
            return Some(parsed);
        }
    }

    let (date, remainder) = parse_date(env, text)?;

    let (time, overflow) = match parse_time_of_day(remainder) {
        Some(parts) => parts,
        None if fill_time => (env.now().time(), 0),
        None => (NaiveTime::MIN, 0),
    };

    let date = date.checked_add_signed(TimeDelta::days(overflow))?;
    Some(ZonedDateTime::from_local(date.and_time(time), tz))
}

/// Extract a date from human-entered text
pub fn date_from_string(env: &Environment, text: &str) -> Option<NaiveDate> {
    parse_date(env, text).map(|(date, _)| date)
}

/// Extract a time of day from human-entered text
pub fn time_from_string(text: &str) -> Option<NaiveTime> {
    parse_time_of_day(text).map(|(time, _)| time)
}

/// Find a date in `text`, returning it and the text after it
fn parse_date<'a>(env: &Environment, text: &'a str) -> Option<(NaiveDate, &'a str)> {
    let text = text.trim_matches(TRIM_CHARS);

    if let (Some(layout), Some(prefix)) = (ISO_DATE_LAYOUT.as_ref(), text.get(..ISO_DATE_LENGTH)) {
        if let Ok(date) = layout.parse_date(prefix) {
            return Some((date, &text[ISO_DATE_LENGTH..]));
        }
    }

    let current_year = env.now().year();

    match env.date_format() {
        DateFormat::YearMonthDay => date_from_pattern(current_year, &PATTERN_YEAR_FIRST, 3, 2, 1, text),
        DateFormat::DayMonthYear => date_from_pattern(current_year, &PATTERN_DAY_FIRST, 1, 2, 3, text),
        DateFormat::MonthDayYear => date_from_pattern(current_year, &PATTERN_DAY_FIRST, 2, 1, 3, text),
    }
}

fn date_from_pattern<'a>(
    current_year: i32,
    pattern: &Regex,
    d: usize,
    m: usize,
    y: usize,
    text: &'a str,
) -> Option<(NaiveDate, &'a str)> {
    for caps in pattern.captures_iter(text) {
        let group = |i: usize| caps.get(i).map(|g| g.as_str()).unwrap_or_default();

        let day: i64 = group(d).parse().unwrap_or(0);
        if day == 0 || day > 31 {
            continue;
        }
        let month: u32 = group(m).parse().unwrap_or(0);
        if month == 0 || month > 12 {
            continue;
        }

        let year_text = group(y);
        let mut year: i32 = year_text.parse().unwrap_or(0);
        if year_text.len() == 2 {
            year += if year > current_year % 1000 { 1900 } else { 2000 };
        }

        let end = caps.get(0).map(|g| g.end()).unwrap_or(text.len());
        if let Some(date) = date_from_parts(year, month, day) {
            return Some((date, &text[end..]));
        }
    }
    None
}

/// Find a time of day in `text`. Returns the time and the number of days it
/// overflows into, e.g. `24:30` is half past midnight the next day.
fn parse_time_of_day(text: &str) -> Option<(NaiveTime, i64)> {
    for caps in PATTERN_TIME.captures_iter(text) {
        let number = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|g| g.as_str().parse().ok())
                .unwrap_or(0)
        };

        let mut hour = number(1);
        let minute = number(2);
        let second = number(3);
        let ampm = caps.get(5).map(|g| g.as_str().to_lowercase()).unwrap_or_default();

        if hour < 12 && ampm == "pm" {
            hour += 12;
        } else if hour == 12 && ampm == "am" {
            hour -= 12;
        }

        let nanos = caps.get(4).map(|g| parse_nanos(g.as_str())).unwrap_or(0);

        // 24:00:00 is midnight
        if hour == 24 && minute == 0 && second == 0 && nanos == 0 {
            hour = 0;
        }

        if hour > 24 || minute > 60 || second > 60 {
            continue;
        }

        return time_from_parts(hour, minute, second, nanos);
    }
    None
}

/// Read fractional second digits as nanoseconds, ignoring digits past nanosecond precision
fn parse_nanos(digits: &str) -> u32 {
    let digits = &digits[..digits.len().min(9)];
    let value: u32 = digits.parse().unwrap_or(0);
    value * 10_u32.pow(9 - digits.len() as u32)
}

/// Which kinds of layout sequence are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Date,
    Time,
    DateTime,
}

impl LayoutMode {
    fn has_date(self) -> bool {
        matches!(self, LayoutMode::Date | LayoutMode::DateTime)
    }

    fn has_time(self) -> bool {
        matches!(self, LayoutMode::Time | LayoutMode::DateTime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    ShortYear,
    LongYear,
    Month,
    ZeroMonth,
    ShortMonthName,
    LongMonthName,
    Day,
    ZeroDay,
    ShortWeekday,
    LongWeekday,
    Hour12,
    ZeroHour12,
    Hour24,
    ZeroHour24,
    Minute,
    ZeroMinute,
    Second,
    ZeroSecond,
    Fraction(usize),
    LowerAmPm,
    UpperAmPm,
    OffsetOrZ,
    Offset,
    Literal(char),
}

impl Item {
    fn symbol(&self) -> String {
        match self {
            Item::ShortYear => "YY".into(),
            Item::LongYear => "YYYY".into(),
            Item::Month => "M".into(),
            Item::ZeroMonth => "MM".into(),
            Item::ShortMonthName => "MMM".into(),
            Item::LongMonthName => "MMMM".into(),
            Item::Day => "D".into(),
            Item::ZeroDay => "DD".into(),
            Item::ShortWeekday => "EEE".into(),
            Item::LongWeekday => "EEEE".into(),
            Item::Hour12 => "h".into(),
            Item::ZeroHour12 => "hh".into(),
            Item::Hour24 => "t".into(),
            Item::ZeroHour24 => "tt".into(),
            Item::Minute => "m".into(),
            Item::ZeroMinute => "mm".into(),
            Item::Second => "s".into(),
            Item::ZeroSecond => "ss".into(),
            Item::Fraction(n) => "f".repeat(*n),
            Item::LowerAmPm => "aa".into(),
            Item::UpperAmPm => "AA".into(),
            Item::OffsetOrZ => "Z".into(),
            Item::Offset => "ZZZ".into(),
            Item::Literal(c) => c.to_string(),
        }
    }
}

/// A parsed date/time layout like `DD-MM-YYYY` or `h:mm aa`.
///
/// Sequences:
///
/// * `YY`, `YYYY` - year as 2 or 4 digits
/// * `M`, `MM` - month 1-12, `MMM`, `MMMM` - month name
/// * `D`, `DD` - day of month
/// * `EEE`, `EEEE` - weekday name
/// * `h`, `hh` - hour 1-12, `t`, `tt` - hour 0-23
/// * `m`, `mm` - minute, `s`, `ss` - second
/// * `fff`, `ffffff`, `fffffffff` - milli, micro and nano seconds
/// * `aa`, `AA` - am/pm, AM/PM
/// * `Z` - offset or `Z` for UTC, `ZZZ` - offset
///
/// and the separators ` : , / . T - _`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    format: String,
    items: Vec<Item>,
}

impl Layout {
    pub fn new(format: &str, mode: LayoutMode) -> Result<Self, XError> {
        let chars: Vec<char> = format.chars().collect();
        let mut items = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let count = chars[i..].iter().take_while(|&&c| c == ch).count();

            let (item, consumed) = match ch {
                'Y' if mode.has_date() => match count {
                    2 => (Item::ShortYear, 2),
                    4 => (Item::LongYear, 4),
                    _ => return Err(invalid_count(ch, count)),
                },
                'M' if mode.has_date() => match count {
                    1 => (Item::Month, 1),
                    2 => (Item::ZeroMonth, 2),
                    3 => (Item::ShortMonthName, 3),
                    4 => (Item::LongMonthName, 4),
                    _ => return Err(invalid_count(ch, count)),
                },
                'D' if mode.has_date() => match count {
                    1 => (Item::Day, 1),
                    _ => (Item::ZeroDay, 2),
                },
                'E' if mode.has_date() => match count {
                    3 => (Item::ShortWeekday, 3),
                    4 => (Item::LongWeekday, 4),
                    _ => return Err(invalid_count(ch, count)),
                },
                'f' if mode.has_time() => match count {
                    3 | 6 | 9 => (Item::Fraction(count), count),
                    _ => return Err(invalid_count(ch, count)),
                },
                'h' if mode.has_time() => match count {
                    1 => (Item::Hour12, 1),
                    _ => (Item::ZeroHour12, 2),
                },
                't' if mode.has_time() => match count {
                    1 => (Item::Hour24, 1),
                    2 => (Item::ZeroHour24, 2),
                    _ => return Err(invalid_count(ch, count)),
                },
                'm' if mode.has_time() => match count {
                    1 => (Item::Minute, 1),
                    2 => (Item::ZeroMinute, 2),
                    _ => return Err(invalid_count(ch, count)),
                },
                's' if mode.has_time() => match count {
                    1 => (Item::Second, 1),
                    2 => (Item::ZeroSecond, 2),
                    _ => return Err(invalid_count(ch, count)),
                },
                'a' if mode.has_time() => match count {
                    2 => (Item::LowerAmPm, 2),
                    _ => return Err(invalid_count(ch, count)),
                },
                'A' if mode.has_time() => match count {
                    2 => (Item::UpperAmPm, 2),
                    _ => return Err(invalid_count(ch, count)),
                },
                'Z' if mode == LayoutMode::DateTime => match count {
                    1 => (Item::OffsetOrZ, 1),
                    3 => (Item::Offset, 3),
                    _ => return Err(invalid_count(ch, count)),
                },
                ' ' | ':' | ',' | '/' | '.' | 'T' | '-' | '_' => (Item::Literal(ch), 1),
                _ => {
                    return Err(XError::new(format!(
                        "invalid date format, unknown format char: {}",
                        ch
                    )))
                }
            };

            items.push(item);
            i += consumed;
        }

        Ok(Self {
            format: format.to_string(),
            items,
        })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        self.render(date.and_time(NaiveTime::MIN), 0)
    }

    pub fn format_time(&self, time: NaiveTime) -> String {
        self.render(NaiveDate::default().and_time(time), 0)
    }

    pub fn format_datetime(&self, dt: &ZonedDateTime) -> String {
        self.render(dt.naive_local(), dt.offset_seconds())
    }

    fn render(&self, dt: NaiveDateTime, offset: i32) -> String {
        let mut out = String::new();
        let hour12 = match dt.hour() % 12 {
            0 => 12,
            h => h,
        };
        let month_name = MONTH_NAMES[dt.month0() as usize];
        let weekday_name = WEEKDAY_NAMES[dt.weekday().num_days_from_sunday() as usize];

        for item in &self.items {
            match item {
                Item::ShortYear => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
                Item::LongYear => out.push_str(&format!("{:04}", dt.year())),
                Item::Month => out.push_str(&dt.month().to_string()),
                Item::ZeroMonth => out.push_str(&format!("{:02}", dt.month())),
                Item::ShortMonthName => out.push_str(&month_name[..3]),
                Item::LongMonthName => out.push_str(month_name),
                Item::Day => out.push_str(&dt.day().to_string()),
                Item::ZeroDay => out.push_str(&format!("{:02}", dt.day())),
                Item::ShortWeekday => out.push_str(&weekday_name[..3]),
                Item::LongWeekday => out.push_str(weekday_name),
                Item::Hour12 => out.push_str(&hour12.to_string()),
                Item::ZeroHour12 => out.push_str(&format!("{:02}", hour12)),
                Item::Hour24 => out.push_str(&dt.hour().to_string()),
                Item::ZeroHour24 => out.push_str(&format!("{:02}", dt.hour())),
                Item::Minute => out.push_str(&dt.minute().to_string()),
                Item::ZeroMinute => out.push_str(&format!("{:02}", dt.minute())),
                Item::Second => out.push_str(&dt.second().to_string()),
                Item::ZeroSecond => out.push_str(&format!("{:02}", dt.second())),
                Item::Fraction(n) => {
                    let value = dt.nanosecond().min(999_999_999) / 10_u32.pow(9 - *n as u32);
                    out.push_str(&format!("{:0width$}", value, width = *n));
                }
                Item::LowerAmPm => out.push_str(if dt.hour() < 12 { "am" } else { "pm" }),
                Item::UpperAmPm => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
                Item::OffsetOrZ => out.push_str(&format_offset(offset, true, true)),
                Item::Offset => out.push_str(&format_offset(offset, true, false)),
                Item::Literal(c) => out.push(*c),
            }
        }
        out
    }

    /// Parse `text` as a datetime. Without an offset in the text, the datetime is in `tz`.
    pub fn parse_datetime(&self, text: &str, tz: Tz) -> Result<ZonedDateTime, XError> {
        let parts = self.parse_parts(text)?;
        let naive = parts.naive(text)?;

        match parts.offset {
            Some(seconds) => {
                let offset = FixedOffset::east_opt(seconds)
                    .ok_or_else(|| XError::new(format!("parsing time \"{}\": offset out of range", text)))?;
                let utc = naive - TimeDelta::seconds(seconds as i64);
                let dt = DateTime::<FixedOffset>::from_naive_utc_and_offset(utc, offset);
                Ok(ZonedDateTime::from_offset_in(dt, tz))
            }
            None => Ok(ZonedDateTime::from_local(naive, tz)),
        }
    }

    pub fn parse_date(&self, text: &str) -> Result<NaiveDate, XError> {
        let parts = self.parse_parts(text)?;
        Ok(parts.naive(text)?.date())
    }

    pub fn parse_time(&self, text: &str) -> Result<NaiveTime, XError> {
        let parts = self.parse_parts(text)?;
        Ok(parts.naive(text)?.time())
    }

    fn parse_parts(&self, text: &str) -> Result<Parts, XError> {
        let mut parts = Parts::default();
        let mut rest = text;
        let mut pm: Option<bool> = None;

        for (i, item) in self.items.iter().enumerate() {
            let mismatch = |rest: &str| {
                XError::new(format!(
                    "parsing time \"{}\" as \"{}\": cannot parse \"{}\" as \"{}\"",
                    text,
                    self.format,
                    rest,
                    item.symbol()
                ))
            };
            let out_of_range =
                |field: &str| XError::new(format!("parsing time \"{}\": {} out of range", text, field));

            match item {
                Item::ShortYear => {
                    let (value, r) = take_digits(rest, 2, 2).ok_or_else(|| mismatch(rest))?;
                    parts.year = value as i32 + if value >= 69 { 1900 } else { 2000 };
                    rest = r;
                }
                Item::LongYear => {
                    let (value, r) = take_digits(rest, 4, 4).ok_or_else(|| mismatch(rest))?;
                    parts.year = value as i32;
                    rest = r;
                }
                Item::Month | Item::ZeroMonth => {
                    let min = if *item == Item::Month { 1 } else { 2 };
                    let (value, r) = take_digits(rest, min, 2).ok_or_else(|| mismatch(rest))?;
                    if !(1..=12).contains(&value) {
                        return Err(out_of_range("month"));
                    }
                    parts.month = value;
                    rest = r;
                }
                Item::ShortMonthName | Item::LongMonthName => {
                    let short = *item == Item::ShortMonthName;
                    let (index, r) = take_name(rest, &MONTH_NAMES, short).ok_or_else(|| mismatch(rest))?;
                    parts.month = index as u32 + 1;
                    rest = r;
                }
                Item::Day | Item::ZeroDay => {
                    let min = if *item == Item::Day { 1 } else { 2 };
                    let (value, r) = take_digits(rest, min, 2).ok_or_else(|| mismatch(rest))?;
                    if !(1..=31).contains(&value) {
                        return Err(out_of_range("day"));
                    }
                    parts.day = value;
                    rest = r;
                }
                Item::ShortWeekday | Item::LongWeekday => {
                    let short = *item == Item::ShortWeekday;
                    let (_, r) = take_name(rest, &WEEKDAY_NAMES, short).ok_or_else(|| mismatch(rest))?;
                    rest = r;
                }
                Item::Hour12 | Item::ZeroHour12 | Item::Hour24 | Item::ZeroHour24 => {
                    let (min, max_value) = match item {
                        Item::ZeroHour12 => (2, 12),
                        Item::Hour12 => (1, 12),
                        Item::ZeroHour24 => (2, 23),
                        _ => (1, 23),
                    };
                    let (value, r) = take_digits(rest, min, 2).ok_or_else(|| mismatch(rest))?;
                    if value > max_value {
                        return Err(out_of_range("hour"));
                    }
                    parts.hour = value;
                    rest = r;
                }
                Item::Minute | Item::ZeroMinute => {
                    let min = if *item == Item::Minute { 1 } else { 2 };
                    let (value, r) = take_digits(rest, min, 2).ok_or_else(|| mismatch(rest))?;
                    if value > 59 {
                        return Err(out_of_range("minute"));
                    }
                    parts.minute = value;
                    rest = r;
                }
                Item::Second | Item::ZeroSecond => {
                    let min = if *item == Item::Second { 1 } else { 2 };
                    let (value, r) = take_digits(rest, min, 2).ok_or_else(|| mismatch(rest))?;
                    if value > 59 {
                        return Err(out_of_range("second"));
                    }
                    parts.second = value;
                    rest = r;

                    // fractional seconds are accepted even when the layout doesn't ask for them
                    let explicit_fraction = matches!(self.items.get(i + 1), Some(Item::Literal('.')));
                    if !explicit_fraction {
                        if let Some(fraction) = rest.strip_prefix('.') {
                            let digits = fraction.chars().take_while(|c| c.is_ascii_digit()).count();
                            if digits > 0 {
                                parts.nanos = parse_nanos(&fraction[..digits]);
                                rest = &fraction[digits..];
                            }
                        }
                    }
                }
                Item::Fraction(n) => {
                    let (_, r) = take_digits(rest, *n, *n).ok_or_else(|| mismatch(rest))?;
                    parts.nanos = parse_nanos(&rest[..*n]);
                    rest = r;
                }
                Item::LowerAmPm | Item::UpperAmPm => {
                    let marker = rest.get(..2).ok_or_else(|| mismatch(rest))?;
                    if marker.eq_ignore_ascii_case("am") {
                        pm = Some(false);
                    } else if marker.eq_ignore_ascii_case("pm") {
                        pm = Some(true);
                    } else {
                        return Err(mismatch(rest));
                    }
                    rest = &rest[2..];
                }
                Item::OffsetOrZ | Item::Offset => {
                    if *item == Item::OffsetOrZ {
                        if let Some(r) = rest.strip_prefix('Z') {
                            parts.offset = Some(0);
                            rest = r;
                            continue;
                        }
                    }
                    let (seconds, r) = take_offset(rest).ok_or_else(|| mismatch(rest))?;
                    parts.offset = Some(seconds);
                    rest = r;
                }
                Item::Literal(c) => {
                    rest = rest.strip_prefix(*c).ok_or_else(|| mismatch(rest))?;
                }
            }
        }

        if !rest.is_empty() {
            return Err(XError::new(format!(
                "parsing time \"{}\": extra text: \"{}\"",
                text, rest
            )));
        }

        match pm {
            Some(true) if parts.hour < 12 => parts.hour += 12,
            Some(false) if parts.hour == 12 => parts.hour = 0,
            _ => {}
        }

        Ok(parts)
    }
}

fn invalid_count(ch: char, count: usize) -> XError {
    XError::new(format!(
        "invalid date format, invalid count of '{}' format: {}",
        ch, count
    ))
}

/// Fields read from text by a layout, defaulting to midnight on January 1st of year 0
#[derive(Debug)]
struct Parts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanos: u32,
    offset: Option<i32>,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            year: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanos: 0,
            offset: None,
        }
    }
}

impl Parts {
    fn naive(&self, text: &str) -> Result<NaiveDateTime, XError> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| XError::new(format!("parsing time \"{}\": day out of range", text)))?;
        let time = NaiveTime::from_hms_nano_opt(self.hour, self.minute, self.second, self.nanos)
            .ok_or_else(|| XError::new(format!("parsing time \"{}\": time out of range", text)))?;
        Ok(date.and_time(time))
    }
}

/// Take between `min` and `max` ASCII digits from the start of `text`
fn take_digits(text: &str, min: usize, max: usize) -> Option<(u32, &str)> {
    let count = text.bytes().take(max).take_while(|b| b.is_ascii_digit()).count();
    if count < min {
        return None;
    }
    let value = text[..count].parse().ok()?;
    Some((value, &text[count..]))
}

/// Take a month or weekday name (or its 3 letter abbreviation) from the start of `text`
fn take_name<'a>(text: &'a str, names: &[&str], short: bool) -> Option<(usize, &'a str)> {
    names.iter().enumerate().find_map(|(i, name)| {
        let name = if short { &name[..3] } else { name };
        let prefix = text.get(..name.len())?;
        if prefix.eq_ignore_ascii_case(name) {
            Some((i, &text[name.len()..]))
        } else {
            None
        }
    })
}

/// Take a `+hh:mm` offset from the start of `text`, returning it in seconds
fn take_offset(text: &str) -> Option<(i32, &str)> {
    let sign = match text.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let (hours, rest) = take_digits(&text[1..], 2, 2)?;
    let rest = rest.strip_prefix(':')?;
    let (minutes, rest) = take_digits(rest, 2, 2)?;
    Some((sign * (hours as i32 * 3600 + minutes as i32 * 60), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::FixedClock;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn env(date_format: DateFormat) -> Environment {
        Environment::builder()
            .with_date_format(date_format)
            .with_timezone(chrono_tz::America::Guayaquil)
            .with_clock(Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2018, 4, 11, 18, 24, 30).unwrap(),
            )))
            .build()
    }

    fn datetime(env: &Environment, text: &str) -> Option<String> {
        datetime_from_string(env, text, false).map(|dt| dt.to_string())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_datetime_from_iso() {
        let env = env(DateFormat::DayMonthYear);
        assert_eq!(
            datetime(&env, "2017-06-12T16:56:59.123456Z"),
            Some("2017-06-12T16:56:59.123456Z".to_string())
        );
        assert_eq!(
            datetime(&env, " 2017-06-12T11:56-05:00 "),
            Some("2017-06-12T11:56:00.000000-05:00".to_string())
        );

        let dt = datetime_from_string(&env, "2017-06-12T11:56:00+02:00", false).unwrap();
        assert_eq!(dt.zone_name(), "");
        let dt = datetime_from_string(&env, "2017-06-12T11:56:00-05:00", false).unwrap();
        assert_eq!(dt.zone_name(), "America/Guayaquil");
    }

    #[test]
    fn test_datetime_from_env_format() {
        let env = env(DateFormat::DayMonthYear);
        assert_eq!(
            datetime(&env, "1/2/2017 3:30pm"),
            Some("2017-02-01T15:30:00.000000-05:00".to_string())
        );
        assert_eq!(
            datetime(&env, "on 31.12.17 at 10:15:20.5"),
            Some("2017-12-31T10:15:20.500000-05:00".to_string())
        );
        assert_eq!(
            datetime(&env, "2017-01-15 10:45"),
            Some("2017-01-15T10:45:00.000000-05:00".to_string())
        );
        assert_eq!(datetime(&env, "not a date"), None);

        let env = self::env(DateFormat::MonthDayYear);
        assert_eq!(
            datetime(&env, "1/2/2017"),
            Some("2017-01-02T00:00:00.000000-05:00".to_string())
        );
    }

    #[test]
    fn test_datetime_fill_time() {
        let env = env(DateFormat::YearMonthDay);
        let dt = datetime_from_string(&env, "2017-01-15", true).unwrap();
        assert_eq!(dt.to_string(), "2017-01-15T13:24:30.000000-05:00");
    }

    #[test]
    fn test_date_from_string() {
        let env = env(DateFormat::DayMonthYear);
        assert_eq!(date_from_string(&env, "12-2-2017"), Some(ymd(2017, 2, 12)));
        // two digit years pivot on the current year
        assert_eq!(date_from_string(&env, "12-2-99"), Some(ymd(1999, 2, 12)));
        assert_eq!(date_from_string(&env, "12-2-17"), Some(ymd(2017, 2, 12)));
        // implausible matches are skipped
        assert_eq!(date_from_string(&env, "45-2-2017 or 3 4 2018"), Some(ymd(2018, 4, 3)));
        assert_eq!(date_from_string(&env, "31 2 2017"), Some(ymd(2017, 3, 3)));
        assert_eq!(date_from_string(&env, "2017"), None);
    }

    #[test]
    fn test_time_from_string() {
        assert_eq!(time_from_string("10:30"), Some(hms(10, 30, 0)));
        assert_eq!(time_from_string("3pm"), Some(hms(15, 0, 0)));
        assert_eq!(time_from_string("12 am"), Some(hms(0, 0, 0)));
        assert_eq!(time_from_string("1530"), Some(hms(15, 30, 0)));
        assert_eq!(time_from_string("24:00"), Some(hms(0, 0, 0)));
        assert_eq!(
            time_from_string("10:30:15.123456789123"),
            NaiveTime::from_hms_nano_opt(10, 30, 15, 123_456_789)
        );
        assert_eq!(time_from_string("99:30 then 7"), Some(hms(7, 0, 0)));
        assert_eq!(time_from_string("abc"), None);
    }

    #[test]
    fn test_layout_errors() {
        let err = Layout::new("YYY-MM-DD", LayoutMode::Date).unwrap_err();
        assert_eq!(err.message(), "invalid date format, invalid count of 'Y' format: 3");

        let err = Layout::new("YYYY-MM-DD tt:mm", LayoutMode::Date).unwrap_err();
        assert_eq!(err.message(), "invalid date format, unknown format char: t");

        let err = Layout::new("tt:mm ZZ", LayoutMode::DateTime).unwrap_err();
        assert_eq!(err.message(), "invalid date format, invalid count of 'Z' format: 2");

        let err = Layout::new("YYYY", LayoutMode::Time).unwrap_err();
        assert_eq!(err.message(), "invalid date format, unknown format char: Y");

        assert!(Layout::new("EEEE, MMMM D, YYYY", LayoutMode::Date).is_ok());
    }

    #[test]
    fn test_layout_format() {
        let layout = Layout::new("EEE, MMM D, YY h:mm:ss.fff AA Z", LayoutMode::DateTime).unwrap();
        let dt = ZonedDateTime::from_local(
            ymd(2017, 1, 15).and_hms_milli_opt(14, 5, 9, 123).unwrap(),
            chrono_tz::America::Guayaquil,
        );
        assert_eq!(layout.format_datetime(&dt), "Sun, Jan 15, 17 2:05:09.123 PM -05:00");

        let layout = Layout::new("DD/MM/YYYY", LayoutMode::Date).unwrap();
        assert_eq!(layout.format_date(ymd(2017, 1, 5)), "05/01/2017");

        let layout = Layout::new("h:mm aa", LayoutMode::Time).unwrap();
        assert_eq!(layout.format_time(hms(0, 7, 0)), "12:07 am");

        let layout = Layout::new("YYYY-MM-DDTtt:mm:ssZ", LayoutMode::DateTime).unwrap();
        assert_eq!(layout.format_datetime(&dt.in_tz(Tz::UTC)), "2017-01-15T19:05:09Z");
    }

    #[test]
    fn test_layout_parse_datetime() {
        let tz = chrono_tz::America::Guayaquil;

        let layout = Layout::new("YYYY M DD tt:mm", LayoutMode::DateTime).unwrap();
        let dt = layout.parse_datetime("2010 5 10 12:50", chrono_tz::America::Los_Angeles).unwrap();
        assert_eq!(dt.to_string(), "2010-05-10T12:50:00.000000-07:00");

        let layout = Layout::new("YYYY-MM-DD", LayoutMode::DateTime).unwrap();
        assert_eq!(
            layout.parse_datetime("1979-07-18", tz).unwrap().to_string(),
            "1979-07-18T00:00:00.000000-05:00"
        );

        let err = layout.parse_datetime("NOT DATE", tz).unwrap_err();
        assert_eq!(
            err.message(),
            "parsing time \"NOT DATE\" as \"YYYY-MM-DD\": cannot parse \"NOT DATE\" as \"YYYY\""
        );

        let err = layout.parse_datetime("2017-13-01", tz).unwrap_err();
        assert_eq!(err.message(), "parsing time \"2017-13-01\": month out of range");

        let err = layout.parse_datetime("2017-02-30", tz).unwrap_err();
        assert_eq!(err.message(), "parsing time \"2017-02-30\": day out of range");

        let err = layout.parse_datetime("2017-02-03 extra", tz).unwrap_err();
        assert_eq!(err.message(), "parsing time \"2017-02-03 extra\": extra text: \" extra\"");
    }

    #[test]
    fn test_layout_parse_time() {
        let layout = Layout::new("h:mm aa", LayoutMode::Time).unwrap();
        assert_eq!(layout.parse_time("2:40 pm").unwrap(), hms(14, 40, 0));
        assert_eq!(layout.parse_time("12:00 AM").unwrap(), hms(0, 0, 0));

        let layout = Layout::new("tt:mm:ss", LayoutMode::Time).unwrap();
        assert_eq!(
            layout.parse_time("15:28:30.25").unwrap(),
            NaiveTime::from_hms_milli_opt(15, 28, 30, 250).unwrap()
        );

        let layout = Layout::new("tt:mm:ss.fff", LayoutMode::Time).unwrap();
        assert!(layout.parse_time("15:28:30.25").is_err());
    }

    #[test]
    fn test_layout_parse_names() {
        let layout = Layout::new("EEEE, MMMM D, YYYY", LayoutMode::Date).unwrap();
        assert_eq!(layout.parse_date("monday, february 3, 2020").unwrap(), ymd(2020, 2, 3));
    }
}
