//! Mailbox poller that waits for a matching message.
//!
//! The [`MailPoller`] is the main entry point for this crate. It provides
//! async methods to:
//!
//! - Wait for a message matching a filter, under a deadline
//! - Check the mailbox once for a matching message
//!
//! # Example
//!
//! ```no_run
//! use mailbox_poll::{MailPoller, PollConfig};
//!
//! # async fn example() -> mailbox_poll::Result<()> {
//! let config = PollConfig::builder()
//!     .endpoint("https://api.zeptomail.com/v1.1/inbox/messages")
//!     .api_key("secret")
//!     .recipient("new.user@yopmail.com")
//!     .subject_pattern("(?i)invited to join")
//!     .build()?;
//!
//! let poller = MailPoller::new(config)?;
//! let email = poller.wait_for_email().await?;
//! println!("Setup link: {:?}", email.setup_link());
//! # Ok(())
//! # }
//! ```

use crate::config::{PollConfig, PollingConfig};
use crate::error::{Error, Result};
use crate::extract::ExtractorSet;
use crate::fetch::{HttpMessageSource, MessageSource};
use crate::matcher::{self, MessageFilter};
use crate::message::ExtractedEmail;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Polls a [`MessageSource`] until a message satisfying a [`MessageFilter`] arrives.
///
/// Create using [`MailPoller::new`] for the HTTP provider, or
/// [`MailPoller::from_parts`] for any other source.
///
/// All methods take `&self`; one poller can serve several sequential waits and
/// independent pollers share nothing.
pub struct MailPoller<S: MessageSource = HttpMessageSource> {
    source: S,
    filter: MessageFilter,
    extractors: ExtractorSet,
    polling: PollingConfig,
}

impl MailPoller<HttpMessageSource> {
    /// Creates a poller that reads the configured HTTP endpoint.
    ///
    /// Extraction uses [`ExtractorSet::invitation`] until replaced with
    /// [`with_extractors`](Self::with_extractors).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn new(config: PollConfig) -> Result<Self> {
        let source = HttpMessageSource::new(&config)?;
        Self::from_parts(source, config.filter, config.polling)
    }
}

impl<S: MessageSource> MailPoller<S> {
    /// Creates a poller over an arbitrary message source.
    ///
    /// # Example
    ///
    /// ```
    /// use async_trait::async_trait;
    /// use mailbox_poll::matcher::MessageFilter;
    /// use mailbox_poll::{MailPoller, MessageSource, PollingConfig, RawMessage, Result};
    /// use serde_json::json;
    ///
    /// struct Inbox;
    ///
    /// #[async_trait]
    /// impl MessageSource for Inbox {
    ///     async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
    ///         Ok(vec![RawMessage::new(json!({
    ///             "to": "me@x.com",
    ///             "subject": "Welcome",
    ///             "content": {"html_body": "Temporary Password: hunter2"},
    ///         }))])
    ///     }
    ///
    ///     fn describe(&self) -> String {
    ///         "inbox".into()
    ///     }
    /// }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<()> {
    /// let filter = MessageFilter::new().recipient("me@x.com");
    /// let poller = MailPoller::from_parts(Inbox, filter, PollingConfig::default())?;
    ///
    /// let email = poller.find_match().await?;
    /// assert_eq!(email.temp_password(), Some("hunter2"));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `polling` has a zero interval, a zero
    /// `max_wait`, or an interval longer than `max_wait`.
    pub fn from_parts(source: S, filter: MessageFilter, polling: PollingConfig) -> Result<Self> {
        polling.validate()?;
        Ok(Self {
            source,
            filter,
            extractors: ExtractorSet::invitation(),
            polling,
        })
    }

    /// Replaces the extractors run against the matched message body.
    #[must_use]
    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = extractors;
        self
    }

    /// Returns the message source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the filter messages are matched against.
    #[must_use]
    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    /// Returns the polling configuration.
    #[must_use]
    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    /// Waits for a message matching the filter.
    ///
    /// Each attempt fetches the mailbox and takes the first matching message in
    /// provider order. Retrieval failures count as an empty mailbox. After an
    /// unsuccessful attempt the poller sleeps for the interval, then gives up
    /// once the total elapsed time reaches `max_wait`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WaitTimeout`] if no matching message arrived in time.
    #[instrument(
        name = "MailPoller::wait_for_email",
        skip(self),
        fields(source = %self.source.describe(), filter = %self.filter.description())
    )]
    pub async fn wait_for_email(&self) -> Result<ExtractedEmail> {
        let timeout = self.polling.max_wait;
        let interval = self.polling.interval;
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            if let Some(email) = self.attempt(attempts).await {
                debug!(
                    attempts,
                    elapsed = ?started.elapsed(),
                    fields = email.fields.len(),
                    "Matching message found"
                );
                return Ok(email);
            }

            tokio::time::sleep(interval).await;

            if started.elapsed() >= timeout {
                warn!(
                    attempts,
                    timeout_secs = timeout.as_secs(),
                    "No matching message before deadline"
                );
                return Err(Error::WaitTimeout { timeout, attempts });
            }
        }
    }

    /// Checks the mailbox exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] if no current message matches, including when
    /// the retrieval itself failed.
    #[instrument(
        name = "MailPoller::find_match",
        skip(self),
        fields(source = %self.source.describe(), filter = %self.filter.description())
    )]
    pub async fn find_match(&self) -> Result<ExtractedEmail> {
        self.attempt(1).await.ok_or(Error::NoMatch)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private methods
    // ─────────────────────────────────────────────────────────────────────────

    /// One fetch-and-evaluate pass. Retrieval errors are logged and treated as
    /// an empty mailbox.
    async fn attempt(&self, attempt: u32) -> Option<ExtractedEmail> {
        let messages = match self.source.fetch_messages().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    attempt,
                    error = %e,
                    category = %e.category(),
                    "Retrieval failed, treating as empty mailbox"
                );
                return None;
            }
        };

        debug!(attempt, message_count = messages.len(), "Evaluating messages");

        let found = matcher::first_match(&self.filter, &messages)?;
        let fields = self.extractors.extract_all(&found.body());
        Some(ExtractedEmail::new(found.clone(), fields))
    }
}

impl<S: MessageSource> std::fmt::Debug for MailPoller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailPoller")
            .field("source", &self.source.describe())
            .field("filter", &self.filter.description())
            .field("extractors", &self.extractors)
            .field("polling", &self.polling)
            .finish()
    }
}

/// Builds a poller from `config` and waits for one matching message.
///
/// # Errors
///
/// Returns a configuration error if the HTTP client cannot be built, otherwise
/// [`Error::WaitTimeout`] if no matching message arrived in time.
///
/// # Example
///
/// ```no_run
/// use mailbox_poll::{wait_for_email, PollConfig};
///
/// # async fn example() -> mailbox_poll::Result<()> {
/// let config = PollConfig::builder()
///     .endpoint("https://api.zeptomail.com/v1.1/inbox/messages")
///     .api_key("secret")
///     .recipient("new.user@yopmail.com")
///     .build()?;
///
/// let email = wait_for_email(config).await?;
/// println!("Temporary password: {:?}", email.temp_password());
/// # Ok(())
/// # }
/// ```
pub async fn wait_for_email(config: PollConfig) -> Result<ExtractedEmail> {
    MailPoller::new(config)?.wait_for_email().await
}
