//! Field extraction from matched message bodies.
//!
//! This module provides a [`FieldExtractor`] trait and built-in implementations for
//! the fields transactional emails usually carry: an action link, a temporary
//! credential and the account email. Every extractor is pure; a miss is `None`,
//! never an error, and one extractor failing never affects another.
//!
//! # Example
//!
//! ```
//! use mailbox_poll::extract::{self, ExtractorSet};
//!
//! let html = "<p>Email: </p>new.user@yopmail.com \
//!             <p>Temporary Password: </p>Abc12345 \
//!             <a href='https://x/setup?t=1'>Complete Your Setup</a>";
//!
//! assert_eq!(extract::setup_link(html).as_deref(), Some("https://x/setup?t=1"));
//!
//! let fields = ExtractorSet::invitation().extract_all(html);
//! assert_eq!(fields.get("temp_password"), Some("Abc12345"));
//! assert_eq!(fields.get("user_email"), Some("new.user@yopmail.com"));
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// Field name of the "Complete Your Setup" link.
pub const SETUP_LINK: &str = "setup_link";
/// Field name of the temporary password.
pub const TEMP_PASSWORD: &str = "temp_password";
/// Field name of the account email.
pub const USER_EMAIL: &str = "user_email";

static SETUP_LINK_RULE: LazyLock<Arc<AnchorLinkExtractor>> =
    LazyLock::new(|| Arc::new(AnchorLinkExtractor::new(SETUP_LINK, "Complete Your Setup")));
static TEMP_PASSWORD_RULE: LazyLock<Arc<LabeledValueExtractor>> = LazyLock::new(|| {
    Arc::new(LabeledValueExtractor::new(TEMP_PASSWORD, "Temporary Password:"))
});
static USER_EMAIL_RULE: LazyLock<Arc<LabeledValueExtractor>> =
    LazyLock::new(|| Arc::new(LabeledValueExtractor::new(USER_EMAIL, "Email:")));

/// Extracts the href of the "Complete Your Setup" anchor.
#[must_use]
pub fn setup_link(html: &str) -> Option<Cow<'_, str>> {
    SETUP_LINK_RULE.extract(html)
}

/// Extracts the token following "Temporary Password:".
#[must_use]
pub fn temp_password(html: &str) -> Option<Cow<'_, str>> {
    TEMP_PASSWORD_RULE.extract(html)
}

/// Extracts the token following "Email:".
#[must_use]
pub fn user_email(html: &str) -> Option<Cow<'_, str>> {
    USER_EMAIL_RULE.extract(html)
}

/// Trait for extracting one named field from a message body.
///
/// Implement this trait to scrape fields the built-in extractors don't cover.
///
/// # Example
///
/// ```
/// use mailbox_poll::extract::FieldExtractor;
/// use std::borrow::Cow;
///
/// struct OrderNumber;
///
/// impl FieldExtractor for OrderNumber {
///     fn name(&self) -> &str {
///         "order_number"
///     }
///
///     fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
///         body.split_whitespace()
///             .find(|word| word.starts_with("ORD-"))
///             .map(Cow::Borrowed)
///     }
///
///     fn description(&self) -> &str {
///         "order number"
///     }
/// }
/// ```
pub trait FieldExtractor: Send + Sync {
    /// The key the extracted value is stored under.
    fn name(&self) -> &str;

    /// Attempts to extract the field from the body.
    ///
    /// Uses `Cow<str>` to avoid allocations when the value can be borrowed
    /// directly from the body.
    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>>;

    /// Returns a human-readable description of what this extractor looks for.
    ///
    /// Used in logging.
    fn description(&self) -> &str;
}

/// Regex-based extractor that yields the first capture group.
///
/// # Example
///
/// ```
/// use mailbox_poll::extract::{FieldExtractor, RegexExtractor};
///
/// let code = RegexExtractor::new("code", r"code:\s*(\d+)").unwrap();
/// assert_eq!(code.extract("Your code: 42").as_deref(), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    name: String,
    regex: Regex,
    description: String,
}

impl RegexExtractor {
    /// Creates a new regex extractor.
    ///
    /// The pattern should contain at least one capture group; the first one is
    /// the extracted value.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Self::with_description(name, pattern, format!("regex pattern: {pattern}"))
    }

    /// Creates a new regex extractor with a custom description.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn with_description(
        name: impl Into<String>,
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(pattern)?,
            description: description.into(),
        })
    }
}

impl FieldExtractor for RegexExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| Cow::Borrowed(m.as_str()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Extracts the destination of an anchor whose visible text is a given label.
///
/// The label is matched case-insensitively and may be padded with whitespace.
/// `&amp;` in the href is decoded.
///
/// # Example
///
/// ```
/// use mailbox_poll::extract::{AnchorLinkExtractor, FieldExtractor};
///
/// let reset = AnchorLinkExtractor::new("reset_link", "Reset Password");
/// let html = r#"<a class="btn" href="https://app.example.com/reset?u=1&amp;t=2"> Reset Password </a>"#;
/// assert_eq!(
///     reset.extract(html).as_deref(),
///     Some("https://app.example.com/reset?u=1&t=2")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct AnchorLinkExtractor {
    inner: RegexExtractor,
}

impl AnchorLinkExtractor {
    /// Creates an extractor for the anchor labelled `label`.
    ///
    /// # Panics
    ///
    /// Panics if the regex cannot be compiled (cannot happen, the label is escaped).
    #[must_use]
    pub fn new(name: impl Into<String>, label: &str) -> Self {
        let pattern = format!(
            r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>\s*{}\s*</a>"#,
            regex::escape(label)
        );
        Self {
            inner: RegexExtractor::with_description(
                name,
                &pattern,
                format!("link labelled '{label}'"),
            )
            .expect("valid regex"),
        }
    }
}

impl FieldExtractor for AnchorLinkExtractor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
        self.inner.extract(body).map(|href| {
            if href.contains("&amp;") {
                Cow::Owned(href.replace("&amp;", "&"))
            } else {
                href
            }
        })
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

/// Extracts the token that follows a text marker such as `"Temporary Password:"`.
///
/// Whitespace, non-breaking space entities and any tags between the marker and
/// the value are skipped; the value ends at the next whitespace or `<`. A marker
/// followed only by padding yields nothing.
///
/// # Example
///
/// ```
/// use mailbox_poll::extract::{FieldExtractor, LabeledValueExtractor};
///
/// let code = LabeledValueExtractor::new("code", "Code:");
/// assert_eq!(code.extract("<td>Code:</td><td><b>X7-91</b></td>").as_deref(), Some("X7-91"));
/// assert_eq!(code.extract("Code: 1234 expires soon").as_deref(), Some("1234"));
/// ```
#[derive(Debug, Clone)]
pub struct LabeledValueExtractor {
    inner: RegexExtractor,
}

impl LabeledValueExtractor {
    /// Creates an extractor for the value following `marker`.
    ///
    /// # Panics
    ///
    /// Panics if the regex cannot be compiled (cannot happen, the marker is escaped).
    #[must_use]
    pub fn new(name: impl Into<String>, marker: &str) -> Self {
        let pattern = format!(
            r"(?i){}(?:\s|&nbsp;|&#160;|<[^>]*>)*([^<\s]+)",
            regex::escape(marker)
        );
        Self {
            inner: RegexExtractor::with_description(
                name,
                &pattern,
                format!("value after '{marker}'"),
            )
            .expect("valid regex"),
        }
    }
}

impl FieldExtractor for LabeledValueExtractor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
        self.inner.extract(body).filter(|value| !is_padding(value))
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

fn is_padding(value: &str) -> bool {
    value.replace("&nbsp;", "").replace("&#160;", "").is_empty()
}

/// Extracts the first `http(s)://` URL anywhere in the body.
///
/// Useful for plain-text emails that carry a single link.
#[derive(Debug, Clone)]
pub struct FirstUrlExtractor {
    inner: RegexExtractor,
}

impl FirstUrlExtractor {
    /// Creates a first-URL extractor storing its value under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the regex cannot be compiled (should not happen).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: RegexExtractor::with_description(
                name,
                r#"(?i)(https?://[^\s'"<>]+)"#,
                "first URL",
            )
            .expect("valid regex"),
        }
    }
}

impl FieldExtractor for FirstUrlExtractor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
        self.inner.extract(body)
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

/// Extractor using a closure for custom logic.
///
/// # Example
///
/// ```
/// use mailbox_poll::extract::{ClosureExtractor, FieldExtractor};
/// use std::borrow::Cow;
///
/// let extractor = ClosureExtractor::new(
///     "code_line",
///     |body| {
///         body.lines()
///             .find(|line| line.starts_with("Code:"))
///             .map(|line| Cow::Owned(line.trim_start_matches("Code:").trim().to_string()))
///     },
///     "code line extractor",
/// );
///
/// assert_eq!(extractor.extract("Hello\nCode: ABC123\nThanks").as_deref(), Some("ABC123"));
/// ```
pub struct ClosureExtractor<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    name: String,
    extract_fn: F,
    description: String,
}

impl<F> ClosureExtractor<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    /// Creates a new closure-based extractor.
    #[must_use]
    pub fn new(name: impl Into<String>, extract_fn: F, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extract_fn,
            description: description.into(),
        }
    }
}

impl<F> FieldExtractor for ClosureExtractor<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(&self, body: &'a str) -> Option<Cow<'a, str>> {
        (self.extract_fn)(body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<F> std::fmt::Debug for ClosureExtractor<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureExtractor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Named values scraped from one message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields(BTreeMap<String, String>);

impl ExtractedFields {
    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Stores a value, replacing any earlier one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An ordered collection of extractors run against every matched body.
#[derive(Clone, Default)]
pub struct ExtractorSet {
    extractors: Vec<Arc<dyn FieldExtractor>>,
}

impl ExtractorSet {
    /// Creates a set with no extractors.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The invitation-email set: [`SETUP_LINK`], [`TEMP_PASSWORD`] and [`USER_EMAIL`].
    #[must_use]
    pub fn invitation() -> Self {
        Self {
            extractors: vec![
                Arc::clone(&*SETUP_LINK_RULE) as Arc<dyn FieldExtractor>,
                Arc::clone(&*TEMP_PASSWORD_RULE) as Arc<dyn FieldExtractor>,
                Arc::clone(&*USER_EMAIL_RULE) as Arc<dyn FieldExtractor>,
            ],
        }
    }

    /// Adds an extractor.
    pub fn push(&mut self, extractor: impl FieldExtractor + 'static) {
        self.extractors.push(Arc::new(extractor));
    }

    /// Adds an extractor, builder style.
    #[must_use]
    pub fn with(mut self, extractor: impl FieldExtractor + 'static) -> Self {
        self.push(extractor);
        self
    }

    /// Number of extractors in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Returns `true` if the set has no extractors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Runs every extractor; fields that aren't found are simply absent.
    ///
    /// When two extractors share a name the first hit wins.
    #[must_use]
    pub fn extract_all(&self, body: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::default();
        for extractor in &self.extractors {
            if fields.get(extractor.name()).is_some() {
                continue;
            }
            if let Some(value) = extractor.extract(body) {
                fields.insert(extractor.name(), value.into_owned());
            }
        }
        fields
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.description()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVITE: &str = "<p>Email: </p>new.user@yopmail.com ... \
        <p>Temporary Password: </p>Abc12345 ... \
        <a href='https://x/setup?t=1'>Complete Your Setup</a>";

    #[test]
    fn test_invitation_rules() {
        assert_eq!(setup_link(INVITE).as_deref(), Some("https://x/setup?t=1"));
        assert_eq!(temp_password(INVITE).as_deref(), Some("Abc12345"));
        assert_eq!(user_email(INVITE).as_deref(), Some("new.user@yopmail.com"));
    }

    #[test]
    fn test_fields_are_independent() {
        let html = r#"<a href="https://app.example.com/setup">Complete Your Setup</a>"#;
        let fields = ExtractorSet::invitation().extract_all(html);
        assert_eq!(fields.get(SETUP_LINK), Some("https://app.example.com/setup"));
        assert_eq!(fields.get(TEMP_PASSWORD), None);
        assert_eq!(fields.get(USER_EMAIL), None);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_labeled_value_skips_nbsp_padding() {
        assert_eq!(
            temp_password("<p>Temporary Password:&nbsp;</p><p>Abc12345</p>").as_deref(),
            Some("Abc12345")
        );
        assert_eq!(
            temp_password("Temporary Password:&#160;&nbsp;Abc12345").as_deref(),
            Some("Abc12345")
        );
        assert_eq!(temp_password("<p>Temporary Password:&nbsp;</p>"), None);
        assert_eq!(temp_password("Temporary Password: &nbsp;"), None);
    }

    #[test]
    fn test_invitation_shares_named_rules() {
        let first = ExtractorSet::invitation();
        let second = ExtractorSet::invitation();
        assert_eq!(first.len(), 3);
        for (a, b) in first.extractors.iter().zip(&second.extractors) {
            assert!(Arc::ptr_eq(a, b));
        }
    }

    #[test]
    fn test_malformed_markup_is_a_miss() {
        for body in ["", "<<<>>>", "<a href=>Complete Your Setup", "Temporary Password:"] {
            assert!(ExtractorSet::invitation().extract_all(body).is_empty(), "{body}");
        }
    }

    #[test]
    fn test_setup_link_case_and_whitespace() {
        let html = "<A class=\"btn\" HREF=\"https://x/s\" target=\"_blank\">\n  complete your setup \n</A>";
        assert_eq!(setup_link(html).as_deref(), Some("https://x/s"));
    }

    #[test]
    fn test_setup_link_ignores_other_anchors() {
        let html = r#"<a href="https://x/help">Help</a> <a href="https://x/setup">Complete Your Setup</a>"#;
        assert_eq!(setup_link(html).as_deref(), Some("https://x/setup"));
    }

    #[test]
    fn test_anchor_decodes_ampersands() {
        let html = r#"<a href="https://x/setup?a=1&amp;b=2">Complete Your Setup</a>"#;
        let link = setup_link(html).unwrap();
        assert_eq!(link, "https://x/setup?a=1&b=2");
        assert!(matches!(link, Cow::Owned(_)));
    }

    #[test]
    fn test_labeled_value_stops_at_markup() {
        let html = "<td>Temporary Password:</td><td>Zx9!pQ</td>";
        assert_eq!(temp_password(html).as_deref(), Some("Zx9!pQ"));

        let text = "Temporary Password: Abc12345\nLog in soon.";
        assert_eq!(temp_password(text).as_deref(), Some("Abc12345"));
    }

    #[test]
    fn test_first_url_extractor() {
        let reset = FirstUrlExtractor::new("link");
        let text = "Reset here: https://app.example.com/reset?t=abc. Thanks";
        assert_eq!(
            reset.extract(text).as_deref(),
            Some("https://app.example.com/reset?t=abc.")
        );
        assert_eq!(reset.extract("no links"), None);
    }

    #[test]
    fn test_regex_extractor_returns_borrowed() {
        let extractor = RegexExtractor::new("code", r"code:\s*(\d+)").unwrap();
        let result = extractor.extract("Your code: 12345");
        assert!(matches!(result, Some(Cow::Borrowed("12345"))));
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = ClosureExtractor::new(
            "secret",
            |body| {
                body.lines()
                    .find(|line| line.contains("SECRET"))
                    .map(|line| Cow::Owned(line.replace("SECRET:", "").trim().to_string()))
            },
            "secret extractor",
        );

        assert_eq!(
            extractor.extract("Header\nSECRET: my-value\nFooter").as_deref(),
            Some("my-value")
        );
    }

    #[test]
    fn test_first_extractor_for_a_name_wins() {
        let set = ExtractorSet::empty()
            .with(AnchorLinkExtractor::new("link", "Reset Password"))
            .with(FirstUrlExtractor::new("link"));

        let html = r#"<a href="https://x/help">Help</a><a href="https://x/reset">Reset Password</a>"#;
        assert_eq!(set.extract_all(html).get("link"), Some("https://x/reset"));

        // Falls through to the generic rule when the labelled anchor is missing
        let text = "Open https://x/reset?t=9 to continue";
        assert_eq!(set.extract_all(text).get("link"), Some("https://x/reset?t=9"));
    }
}
