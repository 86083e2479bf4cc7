//! Example: Scrape custom fields from a password-reset email.
//!
//! # Usage
//!
//! ```bash
//! export ZEPTO_API_URL="https://api.zeptomail.com/v1.1/..."
//! export ZEPTO_API_KEY="your-api-key"
//! export RESET_RECIPIENT="someone@yopmail.com"
//!
//! cargo run --example custom_extractor
//! ```

use mailbox_poll::extract::{
    ClosureExtractor, ExtractorSet, FirstUrlExtractor, LabeledValueExtractor, RegexExtractor,
};
use mailbox_poll::{Error, MailPoller, PollConfigBuilder};
use std::borrow::Cow;
use std::env;

#[tokio::main]
async fn main() -> mailbox_poll::Result<()> {
    let recipient =
        env::var("RESET_RECIPIENT").expect("RESET_RECIPIENT environment variable required");

    let config = PollConfigBuilder::from_env("ZEPTO")?
        .recipient(recipient)
        .subject_pattern("(?i)reset")
        .body_pattern(r"https?://")
        .build()?;

    let otp = RegexExtractor::with_description("otp", r"\b(\d{6})\b", "6-digit code")
        .map_err(|source| Error::InvalidPattern {
            pattern: r"\b(\d{6})\b".into(),
            source,
        })?;

    let extractors = ExtractorSet::empty()
        .with(FirstUrlExtractor::new("reset_link"))
        .with(LabeledValueExtractor::new("username", "Username:"))
        .with(otp)
        .with(ClosureExtractor::new(
            "expiry",
            |body: &str| {
                body.lines()
                    .find(|line| line.contains("expires in"))
                    .map(|line| Cow::Owned(line.trim().to_string()))
            },
            "expiry notice line",
        ));

    println!("Extractors: {extractors:?}");

    let poller = MailPoller::new(config)?.with_extractors(extractors);

    // One look first, then wait if nothing is there yet
    let email = match poller.find_match().await {
        Ok(email) => email,
        Err(Error::NoMatch) => poller.wait_for_email().await?,
        Err(e) => return Err(e),
    };

    for (name, value) in email.fields.iter() {
        println!("{name:>12}: {value}");
    }

    Ok(())
}
