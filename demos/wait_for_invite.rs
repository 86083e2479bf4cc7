//! Example: Wait for an invitation email and print its credentials.
//!
//! # Usage
//!
//! ```bash
//! export ZEPTO_API_URL="https://api.zeptomail.com/v1.1/..."
//! export ZEPTO_API_KEY="your-api-key"
//! export INVITE_RECIPIENT="new.user@yopmail.com"
//!
//! cargo run --example wait_for_invite
//! ```

use mailbox_poll::{MailPoller, PollConfigBuilder};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> mailbox_poll::Result<()> {
    let recipient =
        env::var("INVITE_RECIPIENT").expect("INVITE_RECIPIENT environment variable required");

    let config = PollConfigBuilder::from_env("ZEPTO")?
        .recipient(&recipient)
        .subject_pattern("(?i)invited to join")
        .max_wait(Duration::from_secs(60))
        .build()?;

    println!("Waiting for an invitation to {recipient}...");

    let poller = MailPoller::new(config)?;
    let email = poller.wait_for_email().await?;

    println!("\nSubject:            {}", email.subject);
    println!("Setup link:         {}", email.setup_link().unwrap_or("-"));
    println!("Temporary password: {}", email.temp_password().unwrap_or("-"));
    match email.user_email_address() {
        Some(address) => println!("User email:         {address}"),
        None => println!("User email:         -"),
    }

    Ok(())
}
