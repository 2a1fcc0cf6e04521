//! Functions that pick apart encoded text like URNs and attachments

use indexmap::IndexMap;

use super::wrappers::one_text;
use super::{Registry, XResult};
use crate::env::Environment;
use crate::types::{Object, Value, XError};

pub(super) fn register(r: &mut Registry) {
    r.add("urn_parts", one_text(urn_parts));
    r.add("attachment_parts", one_text(attachment_parts));
}

/// A URN of the form `scheme:path[?query][#display]`. The query is dropped.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Urn {
    pub scheme: String,
    pub path: String,
    pub display: String,
}

impl Urn {
    pub fn parse(urn: &str) -> Result<Self, XError> {
        let invalid = |reason: &str| XError::new(format!("{} is not a valid URN: {}", urn, reason));

        let (scheme, rest) = urn.split_once(':').ok_or_else(|| invalid("scheme or path cannot be empty"))?;

        let mut chars = scheme.chars();
        let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !valid_scheme {
            return Err(invalid("scheme must be lowercase letters and digits"));
        }

        let (rest, display) = rest.split_once('#').unwrap_or((rest, ""));
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        if path.is_empty() {
            return Err(invalid("scheme or path cannot be empty"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
            display: display.to_string(),
        })
    }

    /// Human friendly form, which is the display part when there is one
    pub fn format(&self) -> &str {
        if self.display.is_empty() {
            &self.path
        } else {
            &self.display
        }
    }
}

/// `urn_parts("twitterid:3263621177#bobby")` -> `{display: bobby, path: 3263621177, scheme: twitterid}`
fn urn_parts(_: &Environment, urn: String) -> XResult {
    let urn = Urn::parse(&urn)?;

    let mut parts = IndexMap::new();
    parts.insert("scheme".to_string(), Value::Text(urn.scheme));
    parts.insert("path".to_string(), Value::Text(urn.path));
    parts.insert("display".to_string(), Value::Text(urn.display));
    Ok(Value::Object(Object::new(parts)))
}

/// Splits `content-type:url` at the first colon. Without a colon it's all URL.
fn attachment_parts(_: &Environment, attachment: String) -> XResult {
    let (content_type, url) = attachment.split_once(':').unwrap_or(("", attachment.as_str()));

    let mut parts = IndexMap::new();
    parts.insert("content_type".to_string(), Value::text(content_type));
    parts.insert("url".to_string(), Value::text(url));
    Ok(Value::Object(Object::new(parts)))
}
