//! Text manipulation functions

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::wrappers::{initial_text, min_and_max_args, one_number, one_text, text_and_integer, text_and_optional_text, two_text};
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::conversions::{to_integer, to_text};
use crate::types::{number, Value, XError};

/// Runs of letters, marks, digits, `_` and `'`, or single symbols such as emoji
static WORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\pM\pL\pN_']+|\pS").expect("valid regex"));

static NON_PRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}\p{C}]").expect("valid regex"));

pub(super) fn register(r: &mut Registry) {
    r.add("char", one_number(char_from_code));
    r.add("code", one_text(code));
    r.add("split", text_and_optional_text("", split));
    r.add("trim", text_and_optional_text("", trim));
    r.add("trim_left", text_and_optional_text("", trim_left));
    r.add("trim_right", text_and_optional_text("", trim_right));
    r.add("title", one_text(title));
    r.add("word", initial_text(1, 2, word));
    r.add("remove_first_word", one_text(remove_first_word));
    r.add("word_count", text_and_optional_text("", word_count));
    r.add("word_slice", initial_text(1, 3, word_slice));
    r.add("field", initial_text(2, 2, field));
    r.add("clean", one_text(clean));
    r.add("text_slice", initial_text(1, 2, text_slice));
    r.add("lower", one_text(lower));
    r.add("upper", one_text(upper));
    r.add("regex_match", initial_text(1, 2, regex_match));
    r.add("text_length", one_text(text_length));
    r.add("text_compare", two_text(text_compare));
    r.add("repeat", text_and_integer(repeat));
    r.add("replace", min_and_max_args(3, 4, replace));
    r.add("percent", one_number(percent));
    r.add("url_encode", one_text(url_encode));
    r.add("html_decode", one_text(html_decode));
}

/// Split text into words. With no delimiters, words are runs of word
/// characters and each symbol is a word of its own.
pub(super) fn extract_words<'a>(text: &'a str, delimiters: &str) -> Vec<&'a str> {
    if delimiters.is_empty() {
        WORD_TOKEN.find_iter(text).map(|m| m.as_str()).collect()
    } else {
        text.split(|c: char| delimiters.contains(c))
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// Optional delimiters argument, where null means the default
fn delimiters_arg(args: &[Value], index: usize) -> Result<String, XError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(arg) => to_text(arg),
    }
}

fn char_from_code(_: &Environment, code: Decimal) -> XResult {
    let code = number::to_integer(code)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok(Value::Text(c.to_string()))
}

fn code(_: &Environment, text: String) -> XResult {
    match text.chars().next() {
        Some(c) => Ok(Value::from(c as i64)),
        None => Err(XError::new("requires a string of at least one character")),
    }
}

/// `split("a.b.c.", ".")` -> `[a, b, c]`
fn split(_: &Environment, text: String, delimiters: String) -> XResult {
    let words = extract_words(&text, &delimiters);
    Ok(Value::array(words.into_iter().map(Value::text).collect()))
}

fn trim(_: &Environment, text: String, chars: String) -> XResult {
    let trimmed = if chars.is_empty() {
        text.trim()
    } else {
        text.trim_matches(|c: char| chars.contains(c))
    };
    Ok(Value::text(trimmed))
}

fn trim_left(_: &Environment, text: String, chars: String) -> XResult {
    let trimmed = if chars.is_empty() {
        text.trim_start()
    } else {
        text.trim_start_matches(|c: char| chars.contains(c))
    };
    Ok(Value::text(trimmed))
}

fn trim_right(_: &Environment, text: String, chars: String) -> XResult {
    let trimmed = if chars.is_empty() {
        text.trim_end()
    } else {
        text.trim_end_matches(|c: char| chars.contains(c))
    };
    Ok(Value::text(trimmed))
}

/// Capitalizes the first letter after each separator
fn title(_: &Environment, text: String) -> XResult {
    let mut titled = String::with_capacity(text.len());
    let mut after_separator = true;

    for c in text.to_lowercase().chars() {
        if after_separator {
            titled.extend(c.to_uppercase());
        } else {
            titled.push(c);
        }
        after_separator = is_word_separator(c);
    }
    Ok(Value::Text(titled))
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        return !(c.is_ascii_alphanumeric() || c == '_');
    }
    !c.is_alphanumeric() && c.is_whitespace()
}

/// `word("bee.cat,dog", -1)` -> `dog`
fn word(_: &Environment, text: String, args: &[Value]) -> XResult {
    let index = to_integer(&args[0])?;
    let delimiters = delimiters_arg(args, 1)?;
    let words = extract_words(&text, &delimiters);

    let len = words.len() as i64;
    let offset = if index < 0 { index as i64 + len } else { index as i64 };

    match usize::try_from(offset).ok().and_then(|i| words.get(i)) {
        Some(w) => Ok(Value::text(*w)),
        None => Err(XError::new(format!(
            "index {} is out of range for the number of words {}",
            index, len
        ))),
    }
}

/// Everything after the first word, starting from the second word
fn remove_first_word(_: &Environment, text: String) -> XResult {
    let words = extract_words(&text, "");
    if words.len() < 2 {
        return Ok(Value::text(""));
    }

    let rest = match text.find(words[0]) {
        Some(start) => &text[start + words[0].len()..],
        None => text.as_str(),
    };
    let rest = match rest.find(words[1]) {
        Some(start) => &rest[start..],
        None => rest,
    };
    Ok(Value::text(rest))
}

fn word_count(_: &Environment, text: String, delimiters: String) -> XResult {
    Ok(Value::from(extract_words(&text, &delimiters).len() as i64))
}

/// Words from `start` up to but not including `end`, where a negative end
/// means all remaining words
fn word_slice(_: &Environment, text: String, args: &[Value]) -> XResult {
    let start = to_integer(&args[0])?;
    if start < 0 {
        return Err(XError::new("must start with a positive index"));
    }

    let end = match args.get(1) {
        Some(arg) => to_integer(arg)?,
        None => -1,
    };
    if end > 0 && end <= start {
        return Err(XError::new("must have a end which is greater than the start"));
    }

    let delimiters = delimiters_arg(args, 2)?;
    let words = extract_words(&text, &delimiters);

    let start = start as usize;
    if start >= words.len() {
        return Ok(Value::text(""));
    }

    let selected = if end > 0 {
        &words[start..(end as usize).min(words.len())]
    } else {
        &words[start..]
    };
    Ok(Value::Text(selected.join(" ")))
}

/// Splits on a separator and picks out one field. A space separator means any
/// run of spaces.
fn field(_: &Environment, text: String, args: &[Value]) -> XResult {
    let index = to_integer(&args[0])?;
    if index < 0 {
        return Err(XError::new("cannot use a negative index"));
    }
    let sep = to_text(&args[1])?;

    let fields: Vec<&str> = if sep.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else if sep == " " {
        text.split(' ').filter(|f| !f.is_empty()).collect()
    } else {
        text.split(sep.as_str()).collect()
    };

    let field = fields.get(index as usize).map(|f| f.trim()).unwrap_or_default();
    Ok(Value::text(field))
}

fn clean(_: &Environment, text: String) -> XResult {
    Ok(Value::Text(NON_PRINTABLE.replace_all(&text, "").into_owned()))
}

/// Characters from `start` up to but not including `end`. Negative indexes
/// count back from the end of the text.
fn text_slice(_: &Environment, text: String, args: &[Value]) -> XResult {
    let length = text.chars().count() as i64;

    let mut start = to_integer(&args[0])? as i64;
    if start < 0 {
        start += length;
    }
    let mut end = match args.get(1) {
        Some(arg) => to_integer(arg)? as i64,
        None => length,
    };
    if end < 0 {
        end += length;
    }

    let sliced: String = text
        .chars()
        .enumerate()
        .filter(|(i, _)| (*i as i64) >= start && (*i as i64) < end)
        .map(|(_, c)| c)
        .collect();
    Ok(Value::Text(sliced))
}

fn lower(_: &Environment, text: String) -> XResult {
    Ok(Value::Text(text.to_lowercase()))
}

fn upper(_: &Environment, text: String) -> XResult {
    Ok(Value::Text(text.to_uppercase()))
}

/// First match of a case-insensitive, multi-line pattern, or one of its groups
fn regex_match(_: &Environment, text: String, args: &[Value]) -> XResult {
    let pattern = to_text(&args[0])?;
    let group = match args.get(1) {
        Some(arg) => to_integer(arg)?,
        None => 0,
    };

    let regex = Regex::new(&format!("(?mi){}", pattern))
        .map_err(|_| XError::new("invalid regular expression"))?;

    regex
        .captures(&text)
        .and_then(|caps| {
            let group = usize::try_from(group).ok()?;
            if group >= caps.len() {
                return None;
            }
            Some(caps.get(group).map(|m| m.as_str().to_string()).unwrap_or_default())
        })
        .map(Value::Text)
        .ok_or_else(|| XError::new("invalid regular expression group"))
}

fn text_length(_: &Environment, text: String) -> XResult {
    Ok(Value::from(text.chars().count() as i64))
}

fn text_compare(_: &Environment, text1: String, text2: String) -> XResult {
    Ok(Value::from(text1.cmp(&text2) as i64))
}

const MAX_REPEAT_LENGTH: usize = 10_000;

fn repeat(_: &Environment, text: String, count: i32) -> XResult {
    if count < 0 {
        return Err(XError::new(format!(
            "must be called with a positive integer, got {}",
            count
        )));
    }
    let length = text.chars().count().saturating_mul(count as usize);
    if length > MAX_REPEAT_LENGTH {
        return Err(XError::new(format!(
            "output would be {} characters, more than the maximum of {}",
            length, MAX_REPEAT_LENGTH
        )));
    }
    Ok(Value::Text(text.repeat(count as usize)))
}

/// Replaces up to `count` occurrences, or all of them when count is omitted or negative
fn replace(_: &Environment, args: &[Value]) -> XResult {
    let text = to_text(&args[0])?;
    let needle = to_text(&args[1])?;
    let replacement = to_text(&args[2])?;
    let count = match args.get(3) {
        Some(arg) => to_integer(arg)?,
        None => -1,
    };

    let replaced = if count < 0 {
        text.replace(&needle, &replacement)
    } else {
        text.replacen(&needle, &replacement, count as usize)
    };
    Ok(Value::Text(replaced))
}

/// `percent(0.54234)` -> `54%`
fn percent(_: &Environment, n: Decimal) -> XResult {
    let percent = number::round(number::mul(n, Decimal::ONE_HUNDRED)?, 0);
    Ok(Value::Text(format!("{}%", number::render(&percent.trunc()))))
}

fn url_encode(_: &Environment, text: String) -> XResult {
    Ok(Value::Text(urlencoding::encode(&text).into_owned()))
}

/// Decodes HTML entities, with non-breaking spaces becoming plain spaces
fn html_decode(_: &Environment, text: String) -> XResult {
    let decoded = html_escape::decode_html_entities(&text);
    Ok(Value::Text(decoded.replace('\u{a0}', " ")))
}
