//! Message matching on recipient, subject and body.
//!
//! A [`MessageFilter`] decides whether one [`RawMessage`] is the message the caller
//! is waiting for. Unset criteria accept everything.
//!
//! # Example
//!
//! ```
//! use mailbox_poll::matcher::MessageFilter;
//! use mailbox_poll::RawMessage;
//! use serde_json::json;
//!
//! let filter = MessageFilter::new()
//!     .recipient("bob@x.com")
//!     .subject_pattern("(?i)invited to join")
//!     .unwrap();
//!
//! let msg = RawMessage::new(json!({
//!     "to": "Alice <alice@x.com>, Bob <bob@x.com>",
//!     "subject": "You've been INVITED to join ExampleApp",
//! }));
//! assert!(filter.matches(&msg));
//! ```

use crate::error::{Error, Result};
use crate::message::RawMessage;
use regex::Regex;

/// Criteria a message must satisfy.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    recipient: Option<String>,
    subject: Option<Regex>,
    body: Option<Regex>,
}

impl MessageFilter {
    /// Creates a filter that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the recipient field to contain `recipient` (case-sensitive substring).
    ///
    /// An empty string clears the criterion.
    #[must_use]
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        let recipient = recipient.into();
        self.recipient = (!recipient.is_empty()).then_some(recipient);
        self
    }

    /// Requires the subject to match `pattern`.
    ///
    /// Use an inline `(?i)` flag for case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    pub fn subject_pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.subject_regex(compile(pattern)?))
    }

    /// Requires the subject to match an already-compiled regex.
    #[must_use]
    pub fn subject_regex(mut self, regex: Regex) -> Self {
        self.subject = Some(regex);
        self
    }

    /// Requires the body to match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    pub fn body_pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.body_regex(compile(pattern)?))
    }

    /// Requires the body to match an already-compiled regex.
    #[must_use]
    pub fn body_regex(mut self, regex: Regex) -> Self {
        self.body = Some(regex);
        self
    }

    /// Returns the recipient criterion, if any.
    #[must_use]
    pub fn recipient_filter(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    /// Returns `true` if `message` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, message: &RawMessage) -> bool {
        if let Some(recipient) = &self.recipient {
            if !message.recipients().contains(recipient.as_str()) {
                return false;
            }
        }

        if let Some(subject) = &self.subject {
            if !subject.is_match(&message.subject()) {
                return false;
            }
        }

        if let Some(body) = &self.body {
            if !body.is_match(&message.body()) {
                return false;
            }
        }

        true
    }

    /// Returns a human-readable summary for logs.
    #[must_use]
    pub fn description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(recipient) = &self.recipient {
            parts.push(format!("to~{recipient}"));
        }
        if let Some(subject) = &self.subject {
            parts.push(format!("subject=/{}/", subject.as_str()));
        }
        if let Some(body) = &self.body {
            parts.push(format!("body=/{}/", body.as_str()));
        }

        if parts.is_empty() {
            "any message".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Returns the first message (in provider order) that satisfies `filter`.
#[must_use]
pub fn first_match<'a>(
    filter: &MessageFilter,
    messages: &'a [RawMessage],
) -> Option<&'a RawMessage> {
    messages.iter().find(|message| filter.matches(message))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
