//! # mailbox-poll
//!
//! Async poller for transactional-email mailbox APIs, built for end-to-end tests that
//! need to read an email the application under test just sent.
//!
//! This crate provides a high-level, async API for:
//! - Fetching the message list from a provider's HTTP retrieval API (with optional proxy)
//! - Waiting, under a deadline, for a message matching recipient/subject/body criteria
//! - Scraping values out of the matched body: action links, temporary passwords, emails
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailbox_poll::{MailPoller, PollConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> mailbox_poll::Result<()> {
//! // Configure the poll
//! let config = PollConfig::builder()
//!     .endpoint("https://api.zeptomail.com/v1.1/inbox/messages")
//!     .api_key("your-api-key")
//!     .recipient("new.user@yopmail.com")
//!     .subject_pattern("(?i)invited to join")
//!     .max_wait(Duration::from_secs(60))
//!     .build()?;
//!
//! // Wait for the invitation
//! let poller = MailPoller::new(config)?;
//! let email = poller.wait_for_email().await?;
//!
//! println!("Setup link: {:?}", email.setup_link());
//! println!("Temporary password: {:?}", email.temp_password());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration From the Environment
//!
//! ```no_run
//! use mailbox_poll::{wait_for_email, PollConfigBuilder};
//!
//! # async fn example() -> mailbox_poll::Result<()> {
//! // Reads ZEPTO_API_URL, ZEPTO_API_KEY and optional
//! // ZEPTO_POLL_INTERVAL_SECS / ZEPTO_TIMEOUT_SECS
//! let config = PollConfigBuilder::from_env("ZEPTO")?
//!     .recipient("new.user@yopmail.com")
//!     .build()?;
//!
//! let email = wait_for_email(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Field Extraction
//!
//! ```
//! use mailbox_poll::extract::{ClosureExtractor, ExtractorSet, FirstUrlExtractor, RegexExtractor};
//! use std::borrow::Cow;
//!
//! let extractors = ExtractorSet::invitation()
//!     // Extract a token from the body
//!     .with(RegexExtractor::new("token", r"token=([a-f0-9]{32})").unwrap())
//!     // Any link at all
//!     .with(FirstUrlExtractor::new("first_link"))
//!     // Or use a closure for complex logic
//!     .with(ClosureExtractor::new(
//!         "secret",
//!         |text: &str| {
//!             text.lines()
//!                 .find(|line| line.starts_with("SECRET:"))
//!                 .map(|line| Cow::Owned(line.trim_start_matches("SECRET:").trim().to_string()))
//!         },
//!         "secret extractor",
//!     ));
//!
//! let fields = extractors.extract_all("token=0123456789abcdef0123456789abcdef");
//! assert_eq!(fields.get("token"), Some("0123456789abcdef0123456789abcdef"));
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. A running poll only
//! ever fails with [`Error::WaitTimeout`]; retrieval failures are absorbed between
//! attempts. Use [`Error::is_retryable`] to tell transient failures from permanent ones:
//!
//! ```
//! use mailbox_poll::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error: {}", error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit spans with
//! structured fields.
//!
//! ### Span Naming Convention
//!
//! - `MailPoller::wait_for_email` - Waiting for a message
//! - `MailPoller::find_match` - Single mailbox check
//! - `HttpMessageSource::fetch_messages` - One retrieval request
//!
//! ### Standard Fields
//!
//! - `source` - Endpoint scheme, host and path (never the query string or key)
//! - `filter` - Filter description
//! - `attempt` - Attempt number within a poll
//! - `status` - HTTP status of a retrieval
//! - `shape` - Detected response shape
//! - `message_count` - Messages in one retrieval

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod known_providers;
pub mod matcher;
pub mod message;
pub mod normalize;
pub mod proxy;

// Internal modules
mod client;

// Re-exports for ergonomic API
pub use client::{wait_for_email, MailPoller};
pub use config::{PollConfig, PollConfigBuilder, PollingConfig, TimeoutConfig};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use fetch::{HttpMessageSource, MessageSource};
pub use known_providers::{AuthScheme, ProviderRegistry};
pub use message::{ExtractedEmail, RawMessage};
pub use proxy::{Proxy, ProxyAuth, ProxyKind};
