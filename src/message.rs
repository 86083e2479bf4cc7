//! Provider messages and poll results.
//!
//! Providers return loosely-shaped JSON. [`RawMessage`] keeps the item untouched
//! and exposes the three fields the poller cares about through lenient accessors
//! that never fail: a missing or oddly-typed field reads as an empty string.

use crate::extract::{ExtractedFields, SETUP_LINK, TEMP_PASSWORD, USER_EMAIL};
use email_address::EmailAddress;
use serde_json::Value;
use std::borrow::Cow;

/// Keys probed for the recipient list, in order.
const RECIPIENT_KEYS: [&str; 2] = ["to", "recipients"];

/// One message item exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage(Value);

impl RawMessage {
    /// Wraps a provider list item.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the message and returns the underlying JSON.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the recipient field as text (`to`, falling back to `recipients`).
    ///
    /// Lists are joined with `,`; objects are rendered as compact JSON so that
    /// addresses nested inside them are still found by a substring search.
    #[must_use]
    pub fn recipients(&self) -> Cow<'_, str> {
        RECIPIENT_KEYS
            .iter()
            .find_map(|key| self.0.get(key).filter(|v| is_truthy(v)))
            .map_or(Cow::Borrowed(""), render_text)
    }

    /// Returns the subject, or an empty string.
    #[must_use]
    pub fn subject(&self) -> Cow<'_, str> {
        self.0
            .get("subject")
            .filter(|v| is_truthy(v))
            .map_or(Cow::Borrowed(""), render_text)
    }

    /// Returns the body, preferring HTML over plain text.
    ///
    /// Looks at `content.html_body`, `content.text_body`, then a string
    /// `content`, then the top-level `html`, `body` and `plain` keys.
    #[must_use]
    pub fn body(&self) -> Cow<'_, str> {
        let content = self.0.get("content");
        let candidates = [
            content.and_then(|c| c.get("html_body")),
            content.and_then(|c| c.get("text_body")),
            content.filter(|c| c.is_string()),
            self.0.get("html"),
            self.0.get("body"),
            self.0.get("plain"),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|v| is_truthy(v))
            .map_or(Cow::Borrowed(""), render_text)
    }
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// `null`, `false`, `0` and `""` count as absent so the next candidate key is tried.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(render_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Cow::Owned(other.to_string()),
    }
}

/// A matched message plus the fields scraped from its body.
#[derive(Debug, Clone)]
pub struct ExtractedEmail {
    /// The matched message, for inspection and debugging.
    pub raw: RawMessage,
    /// The message subject.
    pub subject: String,
    /// The message body (HTML when available, else text).
    pub body: String,
    /// Fields produced by the configured extractors.
    pub fields: ExtractedFields,
}

impl ExtractedEmail {
    pub(crate) fn new(raw: RawMessage, fields: ExtractedFields) -> Self {
        let subject = raw.subject().into_owned();
        let body = raw.body().into_owned();
        Self {
            raw,
            subject,
            body,
            fields,
        }
    }

    /// Returns a named field, if it was found.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// The "Complete Your Setup" link.
    #[must_use]
    pub fn setup_link(&self) -> Option<&str> {
        self.field(SETUP_LINK)
    }

    /// The value following "Temporary Password:".
    #[must_use]
    pub fn temp_password(&self) -> Option<&str> {
        self.field(TEMP_PASSWORD)
    }

    /// The value following "Email:".
    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.field(USER_EMAIL)
    }

    /// The extracted user email, if present and syntactically valid.
    #[must_use]
    pub fn user_email_address(&self) -> Option<EmailAddress> {
        self.user_email().and_then(|email| {
            EmailAddress::parse_with_options(email, email_address::Options::default()).ok()
        })
    }
}
