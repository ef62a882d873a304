//! Demo: structured logging with the `tracing` ecosystem.
//!
//! All major operations in email-watch emit tracing spans and events; this
//! demo wires up a subscriber so you can watch the poll loop work.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=email_watch=debug
//!
//! cargo run --example with_tracing
//! ```

use email_watch::{InboxWatcher, WatchConfig};
use std::env;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> email_watch::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("email_watch=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .init();

    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    tracing::info!(email = %email, "Starting email-watch demo");

    let config = WatchConfig::builder()
        .email(&email)
        .password(password)
        .poll_interval(Duration::from_secs(2))
        .wait_timeout(Duration::from_secs(30))
        .build()?;

    let mut watcher = InboxWatcher::connect(config).await?;

    tracing::info!("Connected, waiting for a new message");

    match watcher.wait_for_new_message().await? {
        Some(message) => {
            tracing::info!(from = %message.from, subject = %message.subject, "Delivery confirmed");
            println!("\nDelivered: {}", message.subject);
        }
        None => {
            tracing::info!("Wait budget elapsed");
            println!("\nNothing arrived within 30s");
        }
    }

    watcher.logout().await?;

    tracing::info!("Demo completed");

    Ok(())
}
