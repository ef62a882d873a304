//! Basic demo: confirm delivery of a signup verification email.
//!
//! Connects to the mailbox, waits for a new message addressed to the
//! (optionally aliased) signup recipient, and pulls the 6-digit code out of
//! the body.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! # Optional: the address the signup used, e.g. your+signup@email.com
//! export EXPECTED_RECIPIENT="your+signup@email.com"
//! cargo run --example wait_signup_code
//! ```
//!
//! For Gmail, use an [App Password](https://support.google.com/accounts/answer/185833).

use email_watch::{CodeExtractor, InboxWatcher, WatchConfig};
use std::env;

#[tokio::main]
async fn main() -> email_watch::Result<()> {
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    let mut builder = WatchConfig::builder().email(&email).password(password);
    if let Ok(recipient) = env::var("EXPECTED_RECIPIENT") {
        builder = builder.expected_recipient(recipient);
    }
    let config = builder.build()?;

    println!("Connecting to IMAP server for {email}...");

    let mut watcher = InboxWatcher::connect(config).await?;

    println!("Connected! Waiting up to 60s for the signup email...");
    println!("(Trigger the signup now, or press Ctrl+C to cancel)");

    match watcher.wait_for_new_message().await? {
        Some(message) => {
            println!("Delivered: {} / {}", message.from, message.subject);
            match message.extract(&CodeExtractor::six_digit()) {
                Some(code) => println!("Verification code: {code}"),
                None => println!("No 6-digit code in the body"),
            }
        }
        None => println!("Nothing arrived within the wait budget."),
    }

    watcher.logout().await?;

    Ok(())
}
