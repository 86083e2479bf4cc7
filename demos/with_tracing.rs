//! Example: Using tracing for observability.
//!
//! This example demonstrates how to enable structured logging using
//! the `tracing` ecosystem. Every poll, attempt and retrieval in
//! mailbox-poll emits tracing spans and events.
//!
//! # Usage
//!
//! ```bash
//! export ZEPTO_API_URL="https://api.zeptomail.com/v1.1/..."
//! export ZEPTO_API_KEY="your-api-key"
//! export INVITE_RECIPIENT="new.user@yopmail.com"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=mailbox_poll=debug
//!
//! cargo run --example with_tracing
//! ```

use mailbox_poll::{MailPoller, PollConfigBuilder};
use std::env;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mailbox_poll::Result<()> {
    // Use RUST_LOG to control log levels, e.g. RUST_LOG=mailbox_poll=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mailbox_poll=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let recipient = env::var("INVITE_RECIPIENT").unwrap_or_default();

    let config = PollConfigBuilder::from_env("ZEPTO")?
        .recipient(&recipient)
        .poll_interval(Duration::from_secs(5))
        .max_wait(Duration::from_secs(30))
        .request_timeout(Duration::from_secs(10))
        .build()?;

    tracing::info!(recipient = %recipient, auth = %config.auth_scheme, "Starting poll");

    let poller = MailPoller::new(config)?;

    match poller.wait_for_email().await {
        Ok(email) => {
            tracing::info!(subject = %email.subject, fields = email.fields.len(), "Found message");
            println!("\nFound: {}", email.subject);
        }
        Err(e) => {
            tracing::warn!(error = %e, category = %e.category(), "Poll failed");
            println!("\nNo message: {e}");
        }
    }

    Ok(())
}
