//! The environment expressions are evaluated in
//!
//! An [`Environment`] carries the display formats, timezone and locale used by
//! conversions and functions, plus the two shared resources that make
//! evaluation non-deterministic: the clock behind `now()`/`today()` and the
//! random source behind `rand()`/`rand_between()`. Both are injectable traits so
//! tests can pin them.

pub mod dates;

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ExcellentError, ExcellentResult};

/// Number of decimal places in values produced by a [`RandomSource`]
const RANDOM_PLACES: u32 = 16;

/// Supported formats for dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    YearMonthDay,
    MonthDayYear,
    DayMonthYear,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::YearMonthDay => "YYYY-MM-DD",
            DateFormat::MonthDayYear => "MM-DD-YYYY",
            DateFormat::DayMonthYear => "DD-MM-YYYY",
        }
    }
}

impl FromStr for DateFormat {
    type Err = ExcellentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YYYY-MM-DD" => Ok(DateFormat::YearMonthDay),
            "MM-DD-YYYY" => Ok(DateFormat::MonthDayYear),
            "DD-MM-YYYY" => Ok(DateFormat::DayMonthYear),
            _ => Err(ExcellentError::InvalidDateFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported formats for times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFormat {
    HourMinute,
    HourMinuteAmPm,
    HourMinuteSecond,
    HourMinuteSecondAmPm,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::HourMinute => "tt:mm",
            TimeFormat::HourMinuteAmPm => "h:mm aa",
            TimeFormat::HourMinuteSecond => "tt:mm:ss",
            TimeFormat::HourMinuteSecondAmPm => "h:mm:ss aa",
        }
    }
}

impl FromStr for TimeFormat {
    type Err = ExcellentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tt:mm" => Ok(TimeFormat::HourMinute),
            "h:mm aa" => Ok(TimeFormat::HourMinuteAmPm),
            "tt:mm:ss" => Ok(TimeFormat::HourMinuteSecond),
            "h:mm:ss aa" => Ok(TimeFormat::HourMinuteSecondAmPm),
            _ => Err(ExcellentError::InvalidTimeFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How numbers are formatted for display, e.g. `1,234.567`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub decimal_symbol: String,
    pub digit_grouping_symbol: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_symbol: ".".to_string(),
            digit_grouping_symbol: ",".to_string(),
        }
    }
}

/// Source of the current time
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of random decimals in `[0, 1)`
pub trait RandomSource: fmt::Debug + Send + Sync {
    fn next_decimal(&self) -> Decimal;
}

/// Random source seeded from the OS, using the current thread's generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_decimal(&self) -> Decimal {
        random_decimal(&mut rand::thread_rng())
    }
}

/// A deterministic random source, shared safely between threads
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_decimal(&self) -> Decimal {
        // a panic while holding the lock can't leave the generator inconsistent
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        random_decimal(&mut *rng)
    }
}

fn random_decimal<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    let scale = 10_i64.pow(RANDOM_PLACES);
    Decimal::new(rng.gen_range(0..scale), RANDOM_PLACES)
}

/// The environment an expression is evaluated in
#[derive(Debug, Clone)]
pub struct Environment {
    date_format: DateFormat,
    time_format: TimeFormat,
    timezone: Tz,
    number_format: NumberFormat,
    default_language: Option<String>,
    default_country: Option<String>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl Default for Environment {
    fn default() -> Self {
        EnvironmentBuilder::new().build()
    }
}

impl Environment {
    /// Start building an environment from the defaults
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    /// Read an environment from its JSON representation, e.g.
    /// `{"date_format": "DD-MM-YYYY", "timezone": "Africa/Kigali"}`
    pub fn from_json(json: &str) -> ExcellentResult<Self> {
        let config: EnvironmentConfig = serde_json::from_str(json)?;

        let mut builder = EnvironmentBuilder::new()
            .with_date_format(config.date_format.parse()?)
            .with_time_format(config.time_format.parse()?)
            .with_timezone(parse_timezone(&config.timezone)?);

        if let Some(number_format) = config.number_format {
            builder = builder.with_number_format(number_format);
        }
        if let Some(language) = config.default_language {
            builder = builder.with_default_language(language);
        }
        if let Some(country) = config.default_country {
            builder = builder.with_default_country(country);
        }

        Ok(builder.build())
    }

    /// Serialize this environment's settings to JSON
    pub fn to_json(&self) -> ExcellentResult<String> {
        let config = EnvironmentConfig {
            date_format: self.date_format.as_str().to_string(),
            time_format: self.time_format.as_str().to_string(),
            timezone: self.timezone.name().to_string(),
            default_language: self.default_language.clone(),
            default_country: self.default_country.clone(),
            number_format: Some(self.number_format.clone()),
        };
        Ok(serde_json::to_string(&config)?)
    }

    pub fn date_format(&self) -> DateFormat {
        self.date_format
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.number_format
    }

    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    pub fn default_country(&self) -> Option<&str> {
        self.default_country.as_deref()
    }

    /// The current time in this environment's timezone
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.timezone)
    }

    /// The next random decimal in `[0, 1)`
    pub fn random(&self) -> Decimal {
        self.random.next_decimal()
    }
}

/// Parse an IANA timezone name like `America/Guayaquil`
pub fn parse_timezone(name: &str) -> ExcellentResult<Tz> {
    name.parse::<Tz>().map_err(|_| {
        debug!(timezone = name, "unknown timezone");
        ExcellentError::InvalidTimezone {
            name: name.to_string(),
        }
    })
}

fn default_date_format() -> String {
    DateFormat::YearMonthDay.as_str().to_string()
}

fn default_time_format() -> String {
    TimeFormat::HourMinute.as_str().to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// JSON form of an environment
#[derive(Debug, Serialize, Deserialize)]
struct EnvironmentConfig {
    #[serde(default = "default_date_format")]
    date_format: String,
    #[serde(default = "default_time_format")]
    time_format: String,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number_format: Option<NumberFormat>,
}

/// Builder for [`Environment`]
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    env: Environment,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            env: Environment {
                date_format: DateFormat::YearMonthDay,
                time_format: TimeFormat::HourMinute,
                timezone: Tz::UTC,
                number_format: NumberFormat::default(),
                default_language: Some("eng".to_string()),
                default_country: None,
                clock: Arc::new(SystemClock),
                random: Arc::new(ThreadRandom),
            },
        }
    }

    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.env.date_format = date_format;
        self
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.env.time_format = time_format;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.env.timezone = timezone;
        self
    }

    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.env.number_format = number_format;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.env.default_language = Some(language.into());
        self
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.env.default_country = Some(country.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.env.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.env.random = random;
        self
    }

    pub fn build(self) -> Environment {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let env = Environment::default();
        assert_eq!(env.date_format(), DateFormat::YearMonthDay);
        assert_eq!(env.time_format(), TimeFormat::HourMinute);
        assert_eq!(env.timezone(), Tz::UTC);
        assert_eq!(env.number_format(), &NumberFormat::default());
        assert_eq!(env.default_language(), Some("eng"));
        assert_eq!(env.default_country(), None);
    }

    #[test]
    fn test_from_json() {
        let env = Environment::from_json(
            r#"{
                "date_format": "DD-MM-YYYY",
                "time_format": "h:mm aa",
                "timezone": "America/Guayaquil",
                "default_country": "EC",
                "number_format": {"decimal_symbol": ",", "digit_grouping_symbol": "."}
            }"#,
        )
        .unwrap();

        assert_eq!(env.date_format(), DateFormat::DayMonthYear);
        assert_eq!(env.time_format(), TimeFormat::HourMinuteAmPm);
        assert_eq!(env.timezone(), chrono_tz::America::Guayaquil);
        assert_eq!(env.default_country(), Some("EC"));
        assert_eq!(env.number_format().decimal_symbol, ",");
    }

    #[test]
    fn test_from_json_defaults() {
        let env = Environment::from_json("{}").unwrap();
        assert_eq!(env.date_format(), DateFormat::YearMonthDay);
        assert_eq!(env.timezone(), Tz::UTC);
    }

    #[test]
    fn test_from_json_rejects_invalid_settings() {
        let err = Environment::from_json(r#"{"timezone": "Mars/Olympus"}"#).unwrap_err();
        assert_eq!(err.to_string(), "unknown time zone Mars/Olympus");

        let err = Environment::from_json(r#"{"date_format": "YY-MM"}"#).unwrap_err();
        assert!(matches!(err, ExcellentError::InvalidDateFormat { .. }));

        let err = Environment::from_json(r#"{"time_format": "hh"}"#).unwrap_err();
        assert!(matches!(err, ExcellentError::InvalidTimeFormat { .. }));

        let err = Environment::from_json("[1, 2").unwrap_err();
        assert!(matches!(err, ExcellentError::Config(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let env = Environment::builder()
            .with_date_format(DateFormat::MonthDayYear)
            .with_timezone(chrono_tz::Africa::Kigali)
            .build();

        let restored = Environment::from_json(&env.to_json().unwrap()).unwrap();
        assert_eq!(restored.date_format(), DateFormat::MonthDayYear);
        assert_eq!(restored.timezone(), chrono_tz::Africa::Kigali);
    }

    #[test]
    fn test_fixed_clock_in_timezone() {
        let instant = Utc.with_ymd_and_hms(2018, 4, 11, 13, 24, 30).unwrap();
        let env = Environment::builder()
            .with_timezone(chrono_tz::America::Guayaquil)
            .with_clock(Arc::new(FixedClock(instant)))
            .build();

        assert_eq!(env.now().to_rfc3339(), "2018-04-11T08:24:30-05:00");
    }

    #[test]
    fn test_seeded_random_is_deterministic() {
        let a = SeededRandom::new(123);
        let b = SeededRandom::new(123);

        for _ in 0..10 {
            let value = a.next_decimal();
            assert_eq!(value, b.next_decimal());
            assert!(value >= Decimal::ZERO && value < Decimal::ONE);
        }
    }
}
