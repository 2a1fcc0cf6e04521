//! Built-in functions
//!
//! Functions are registered once, by lower-case name, into a table that is
//! read-only for the life of the process. Lookups are case-insensitive.

mod arrays;
mod conversion;
mod datetime;
mod encoded;
mod formatting;
mod number;
mod text;
mod utility;
pub mod wrappers;

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

use crate::types::{Function, Value, XError};
use wrappers::NativeFn;

/// What typed function implementations return
pub type XResult = Result<Value, XError>;

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::default();
    conversion::register(&mut registry);
    text::register(&mut registry);
    number::register(&mut registry);
    datetime::register(&mut registry);
    arrays::register(&mut registry);
    encoded::register(&mut registry);
    formatting::register(&mut registry);
    utility::register(&mut registry);

    debug!(functions = registry.functions.len(), "built function registry");
    registry
});

/// Table of functions by name
#[derive(Default)]
pub(crate) struct Registry {
    functions: HashMap<&'static str, Function>,
}

impl Registry {
    pub(crate) fn add(&mut self, name: &'static str, f: impl NativeFn) {
        self.functions.insert(name, Function::new(name, f));
    }
}

/// Look up a built-in function by name, ignoring case
pub fn lookup(name: &str) -> Option<Function> {
    REGISTRY.functions.get(name.to_lowercase().as_str()).cloned()
}

/// Names of every built-in function, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.functions.keys().copied().collect();
    names.sort_unstable();
    names
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("upper").is_some());
        assert!(lookup("UPPER").is_some());
        assert!(lookup("Format_Number").is_some());
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_lookups_share_the_same_function() {
        assert_eq!(
            lookup("upper").map(Value::Function),
            lookup("UPPER").map(Value::Function)
        );
    }

    #[test]
    fn test_catalogue() {
        let names = names();
        for name in [
            "abs", "and", "array", "attachment_parts", "boolean", "char", "clean", "code", "concat", "count",
            "date", "date_from_parts", "datetime", "datetime_add", "datetime_diff", "datetime_from_epoch",
            "default", "epoch", "extract", "extract_object", "field", "foreach", "foreach_value", "format",
            "format_date", "format_datetime", "format_location", "format_number", "format_time", "format_urn",
            "html_decode", "if", "is_error", "join", "json", "legacy_add", "lower", "max", "mean", "min", "mod",
            "now", "number", "object", "or", "parse_datetime", "parse_json", "parse_time", "percent", "rand",
            "rand_between", "read_chars", "regex_match", "remove_first_word", "repeat", "replace",
            "replace_time", "reverse", "round", "round_down", "round_up", "sort", "split", "sum", "text",
            "text_compare", "text_length", "text_slice", "time", "time_from_parts", "title", "today", "trim",
            "trim_left", "trim_right", "tz", "tz_offset", "unique", "upper", "url_encode", "urn_parts",
            "week_number", "weekday", "word", "word_count", "word_slice",
        ] {
            assert!(names.contains(&name), "missing function {}", name);
        }
    }

    #[test]
    fn test_errors_are_prefixed_with_function_name() {
        assert_eq!(
            call("if", &[Value::Boolean(true), Value::error("I am error"), text("20")]),
            Value::error("error calling IF: I am error")
        );
        assert_eq!(
            call("upper", &[]),
            Value::error("error calling UPPER: need 1 argument(s), got 0")
        );
    }
}
