//! Datetimes that remember the timezone they were created in

use std::cmp::Ordering;
use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;

/// An instant together with the zone used to display it.
///
/// Datetimes parsed with an explicit offset that doesn't belong to the
/// environment's timezone keep that fixed offset and have no zone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedDateTime {
    instant: DateTime<FixedOffset>,
    zone: Option<Tz>,
}

impl ZonedDateTime {
    pub fn from_tz(dt: DateTime<Tz>) -> Self {
        Self {
            instant: dt.fixed_offset(),
            zone: Some(dt.timezone()),
        }
    }

    pub fn from_fixed(dt: DateTime<FixedOffset>) -> Self {
        if dt.offset().local_minus_utc() == 0 {
            return Self::from_tz(dt.with_timezone(&Tz::UTC));
        }
        Self {
            instant: dt,
            zone: None,
        }
    }

    /// Attach `tz` to an instant parsed with an explicit offset, when that offset
    /// is what `tz` uses at that instant
    pub fn from_offset_in(dt: DateTime<FixedOffset>, tz: Tz) -> Self {
        let in_tz = dt.with_timezone(&tz);
        if in_tz.offset().fix() == *dt.offset() {
            Self::from_tz(in_tz)
        } else {
            Self::from_fixed(dt)
        }
    }

    /// The datetime with wall clock `naive` in `tz`. Ambiguous times take the
    /// earlier instant, and times skipped by a transition use the offset in
    /// effect before it.
    pub fn from_local(naive: NaiveDateTime, tz: Tz) -> Self {
        match tz.from_local_datetime(&naive).earliest() {
            Some(dt) => Self::from_tz(dt),
            None => {
                let offset = tz.offset_from_utc_datetime(&naive).fix();
                let utc = naive
                    .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64))
                    .unwrap_or(naive);
                Self::from_tz(Utc.from_utc_datetime(&utc).with_timezone(&tz))
            }
        }
    }

    /// The datetime `nanos` after the UNIX epoch, displayed in `tz`
    pub fn from_timestamp_nanos(nanos: i64, tz: Tz) -> Self {
        Self::from_tz(Utc.timestamp_nanos(nanos).with_timezone(&tz))
    }

    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    pub fn zone(&self) -> Option<Tz> {
        self.zone
    }

    /// The zone's IANA name, or an empty string for a bare offset
    pub fn zone_name(&self) -> String {
        self.zone.map(|tz| tz.name().to_string()).unwrap_or_default()
    }

    /// Seconds east of UTC
    pub fn offset_seconds(&self) -> i32 {
        self.instant.offset().local_minus_utc()
    }

    /// The same instant displayed in `tz`
    pub fn in_tz(&self, tz: Tz) -> Self {
        Self::from_tz(self.instant.with_timezone(&tz))
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.instant.naive_local()
    }

    pub fn date(&self) -> NaiveDate {
        self.instant.date_naive()
    }

    pub fn time(&self) -> NaiveTime {
        self.instant.time()
    }

    /// The datetime with the same zone but wall clock `naive`
    pub fn with_local(&self, naive: NaiveDateTime) -> Self {
        match self.zone {
            Some(tz) => Self::from_local(naive, tz),
            None => {
                let offset = *self.instant.offset();
                let utc = naive
                    .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64))
                    .unwrap_or(naive);
                Self {
                    instant: DateTime::from_naive_utc_and_offset(utc, offset),
                    zone: None,
                }
            }
        }
    }

    /// Replace the time of day, keeping the date and zone
    pub fn replace_time(&self, time: NaiveTime) -> Self {
        self.with_local(self.date().and_time(time))
    }

    /// Add an exact duration
    pub fn add_duration(&self, delta: TimeDelta) -> Option<Self> {
        let instant = self.instant.checked_add_signed(delta)?;
        Some(match self.zone {
            Some(tz) => Self::from_tz(instant.with_timezone(&tz)),
            None => Self {
                instant,
                zone: None,
            },
        })
    }

    /// Add calendar years, months and days to the wall clock, rolling over
    /// days that overflow the month
    pub fn add_date(&self, years: i32, months: i32, days: i64) -> Option<Self> {
        let date = add_date(self.date(), years, months, days)?;
        Some(self.with_local(date.and_time(self.time())))
    }

    /// Nanoseconds since the UNIX epoch
    pub fn timestamp_nanos(&self) -> Option<i64> {
        self.instant.timestamp_nanos_opt()
    }
}

impl PartialEq for ZonedDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for ZonedDateTime {}

impl PartialOrd for ZonedDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ZonedDateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format("%Y-%m-%dT%H:%M:%S%.6f"))?;
        f.write_str(&format_offset(self.offset_seconds(), true, true))
    }
}

/// Format a UTC offset as `+hh:mm` (or `+hhmm` without `colon`), or `Z` for zero
/// when `z_for_utc` is set
pub fn format_offset(seconds: i32, colon: bool, z_for_utc: bool) -> String {
    if seconds == 0 && z_for_utc {
        return "Z".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    if colon {
        format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
    } else {
        format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
    }
}

/// Render a time of day as `hh:mm:ss.ffffff`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S%.6f").to_string()
}

/// Build a date, rolling days past the end of the month into the next month
pub fn date_from_parts(year: i32, month: u32, day: i64) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(TimeDelta::days(day - 1))
}

/// Add calendar years, months and days, rolling over days that overflow the month
pub fn add_date(date: NaiveDate, years: i32, months: i32, days: i64) -> Option<NaiveDate> {
    let total_months = date.year() as i64 * 12 + date.month0() as i64 + years as i64 * 12 + months as i64;
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = total_months.rem_euclid(12) as u32 + 1;
    date_from_parts(year, month, date.day() as i64 + days)
}

/// Build a time of day from parts that may overflow, wrapping at midnight.
/// Returns the time and how many whole days the parts overflowed by.
pub fn time_from_parts(hour: u32, minute: u32, second: u32, nanos: u32) -> Option<(NaiveTime, i64)> {
    let total = hour as i64 * 3600 + minute as i64 * 60 + second as i64;
    let secs = u32::try_from(total.rem_euclid(86_400)).ok()?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?;
    Some((time, total.div_euclid(86_400)))
}

/// Week of the year, with weeks starting on Sunday and the week containing
/// January 1st being week 1
pub fn week_number(date: NaiveDate) -> u32 {
    let jan1 = date.with_ordinal(1).unwrap_or(date);
    (date.ordinal0() + jan1.weekday().num_days_from_sunday()) / 7 + 1
}

/// Whole calendar days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Calendar months from `from` to `to`, ignoring the day of month
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}
