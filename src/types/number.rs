//! Decimal arithmetic, rounding and display for number values

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use super::XError;
use crate::env::NumberFormat;

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(([0-9]+)|([0-9]+\.[0-9]+)|(\.[0-9]+))$").expect("valid regex")
});

/// Decimal places kept by division
const DIVISION_PLACES: u32 = 16;

/// Most decimal places a number can carry
const MAX_SCALE: i32 = 28;

fn out_of_range() -> XError {
    XError::new("number value out of range")
}

/// Parse number text like `12`, `-3.5` or `.5`, ignoring surrounding whitespace
pub fn parse_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if !NUMBER_PATTERN.is_match(text) {
        return None;
    }
    Decimal::from_str(text).ok()
}

/// Render without trailing zeros, so `123.0` is `123`
pub fn render(n: &Decimal) -> String {
    n.normalize().to_string()
}

pub fn add(a: Decimal, b: Decimal) -> Result<Decimal, XError> {
    a.checked_add(b).ok_or_else(out_of_range)
}

pub fn sub(a: Decimal, b: Decimal) -> Result<Decimal, XError> {
    a.checked_sub(b).ok_or_else(out_of_range)
}

pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal, XError> {
    a.checked_mul(b).ok_or_else(out_of_range)
}

pub fn div(a: Decimal, b: Decimal) -> Result<Decimal, XError> {
    if b.is_zero() {
        return Err(XError::new("division by zero"));
    }
    a.checked_div(b)
        .map(|n| n.round_dp_with_strategy(DIVISION_PLACES, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(out_of_range)
}

pub fn modulo(a: Decimal, b: Decimal) -> Result<Decimal, XError> {
    if b.is_zero() {
        return Err(XError::new("division by zero"));
    }
    a.checked_rem(b).ok_or_else(out_of_range)
}

/// Raise `base` to `exponent`. Whole exponents are exact, fractional ones go through `f64`.
pub fn pow(base: Decimal, exponent: Decimal) -> Result<Decimal, XError> {
    if exponent.fract().is_zero() {
        let exponent = exponent.to_i64().ok_or_else(out_of_range)?;
        return base.checked_powi(exponent).ok_or_else(out_of_range);
    }

    let result = match (base.to_f64(), exponent.to_f64()) {
        (Some(b), Some(e)) => b.powf(e),
        _ => return Err(out_of_range()),
    };
    if !result.is_finite() {
        return Err(out_of_range());
    }
    Decimal::from_f64(result)
        .map(|n| n.round_dp_with_strategy(DIVISION_PLACES, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(out_of_range)
}

/// `10^exp`, or `None` if it can't be represented
fn pow10(exp: i32) -> Option<Decimal> {
    if exp >= 0 {
        (0..exp).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))
    } else if -exp <= MAX_SCALE {
        Some(Decimal::new(1, exp.unsigned_abs()))
    } else {
        None
    }
}

/// Places beyond the decimal scale either keep every digit or round to zero,
/// so they're clamped to just outside it.
fn clamp_places(places: i32) -> i32 {
    places.clamp(-MAX_SCALE - 1, MAX_SCALE)
}

/// Round half away from zero. Negative places round the integer part, so
/// `round(1234, -2)` is `1200`.
pub fn round(n: Decimal, places: i32) -> Decimal {
    let places = clamp_places(places);
    if places >= 0 {
        let places = places.min(MAX_SCALE) as u32;
        return n.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    }

    let Some(factor) = pow10(-places) else {
        return Decimal::ZERO;
    };
    (n / factor)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(factor)
        .unwrap_or(n)
}

/// Half of one unit in the last place kept by `places`
fn half_unit(places: i32) -> Option<Decimal> {
    pow10(-places - 1).and_then(|unit| unit.checked_mul(Decimal::from(5)))
}

/// Round towards positive infinity
pub fn round_up(n: Decimal, places: i32) -> Decimal {
    let places = clamp_places(places);
    if pow10(-places).is_none() || round(n, places) == n {
        return n;
    }
    match half_unit(places).and_then(|half| n.checked_add(half)) {
        Some(shifted) => round(shifted, places),
        None => n,
    }
}

/// Round towards negative infinity
pub fn round_down(n: Decimal, places: i32) -> Decimal {
    let places = clamp_places(places);
    if pow10(-places).is_none() || round(n, places) == n {
        return n;
    }
    match half_unit(places).and_then(|half| n.checked_sub(half)) {
        Some(shifted) => round(shifted, places),
        None => n,
    }
}

/// Integer part of a number, which must fit in 32 bits
pub fn to_integer(n: Decimal) -> Result<i32, XError> {
    n.trunc().to_i32().ok_or_else(|| {
        XError::new(format!(
            "number value {} is out of range for an integer",
            render(&n)
        ))
    })
}

/// Format a number for display with the given symbols. `places` fixes the
/// number of decimal places, otherwise trailing zeros are dropped.
pub fn format(n: &Decimal, symbols: &NumberFormat, places: Option<u32>, group: bool) -> String {
    let text = match places {
        Some(places) => {
            let rounded = n.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", places as usize, rounded)
        }
        None => render(n),
    };

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::from(sign);
    if group {
        let digits: Vec<char> = int_part.chars().collect();
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push_str(&symbols.digit_grouping_symbol);
            }
            out.push(*digit);
        }
    } else {
        out.push_str(int_part);
    }

    if let Some(fraction) = fraction {
        out.push_str(&symbols.decimal_symbol);
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12 "), Some(d("12")));
        assert_eq!(parse_number("-3.50"), Some(d("-3.5")));
        assert_eq!(parse_number(".5"), Some(d("0.5")));
        assert_eq!(parse_number("1e5"), None);
        assert_eq!(parse_number("5."), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&d("123.0")), "123");
        assert_eq!(render(&d("0.500")), "0.5");
        assert_eq!(render(&d("-0")), "0");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(div(d("10"), d("4")).unwrap(), d("2.5"));
        assert_eq!(render(&div(d("1"), d("3")).unwrap()), "0.3333333333333333");
        assert_eq!(div(d("1"), d("0")).unwrap_err().message(), "division by zero");
        assert_eq!(modulo(d("5"), d("2")).unwrap(), d("1"));
        assert_eq!(pow(d("2"), d("8")).unwrap(), d("256"));
        assert_eq!(pow(d("2"), d("-1")).unwrap(), d("0.5"));
        assert_eq!(pow(d("4"), d("0.5")).unwrap(), d("2"));
        assert_eq!(mul(Decimal::MAX, d("2")).unwrap_err().message(), "number value out of range");
    }

    #[test]
    fn test_round() {
        assert_eq!(round(d("12.141"), 2), d("12.14"));
        assert_eq!(round(d("12.145"), 2), d("12.15"));
        assert_eq!(round(d("-12.5"), 0), d("-13"));
        assert_eq!(round(d("12.146"), -1), d("10"));
        assert_eq!(round(d("1250"), -2), d("1300"));
        assert_eq!(round_up(d("12.141"), 2), d("12.15"));
        assert_eq!(round_up(d("12"), 0), d("12"));
        assert_eq!(round_up(d("-12.141"), 0), d("-12"));
        assert_eq!(round_down(d("12.149"), 2), d("12.14"));
        assert_eq!(round_down(d("-12.1"), 0), d("-13"));
    }

    #[test]
    fn test_round_extreme_places() {
        assert_eq!(round(d("12.5"), i32::MIN), d("0"));
        assert_eq!(round(d("12.5"), i32::MAX), d("12.5"));
        assert_eq!(round_up(d("12.5"), i32::MIN), d("12.5"));
        assert_eq!(round_up(d("12.5"), i32::MAX), d("12.5"));
        assert_eq!(round_down(d("12.5"), i32::MIN), d("12.5"));
        assert_eq!(round_down(d("12.5"), i32::MAX), d("12.5"));
        assert_eq!(round(d("123456"), -29), d("0"));
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(d("12.9")).unwrap(), 12);
        assert_eq!(to_integer(d("-2.5")).unwrap(), -2);
        assert_eq!(
            to_integer(d("12345678901")).unwrap_err().message(),
            "number value 12345678901 is out of range for an integer"
        );
    }

    #[test]
    fn test_format() {
        let symbols = NumberFormat::default();
        assert_eq!(format(&d("1234.5670"), &symbols, None, true), "1,234.567");
        assert_eq!(format(&d("1234.5678"), &symbols, Some(2), true), "1,234.57");
        assert_eq!(format(&d("1234.5678"), &symbols, Some(0), false), "1235");
        assert_eq!(format(&d("-123456"), &symbols, None, true), "-123,456");
        assert_eq!(format(&d("12"), &symbols, Some(2), true), "12.00");

        let euro = NumberFormat {
            decimal_symbol: ",".into(),
            digit_grouping_symbol: ".".into(),
        };
        assert_eq!(format(&d("1234567.5"), &euro, None, true), "1.234.567,5");
    }

    proptest! {
        #[test]
        fn test_render_round_trips(n in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..8) {
            let num = Decimal::new(n, scale);
            prop_assert_eq!(parse_number(&render(&num)), Some(num));
        }

        #[test]
        fn test_round_up_and_down_bracket(n in -1_000_000i64..1_000_000i64, scale in 0u32..5, places in -2i32..4) {
            let num = Decimal::new(n, scale);
            prop_assert!(round_down(num, places) <= num);
            prop_assert!(round_up(num, places) >= num);
        }
    }
}
