//! # email-watch
//!
//! Async IMAP watcher that confirms delivery of an automated email within a
//! bounded wait window.
//!
//! The typical consumer is an end-to-end test or provisioning flow that
//! triggers an email (a verification code, a signup confirmation) and needs
//! to know it actually arrived. The watcher connects to the mailbox,
//! remembers the newest message present, then polls for mail that is *new*,
//! addressed to the expected recipient, and dated after the wait began.
//!
//! ## Quick Start
//!
//! ```no_run
//! use email_watch::{CodeExtractor, InboxWatcher, WatchConfig};
//!
//! # async fn example() -> email_watch::Result<()> {
//! let config = WatchConfig::builder()
//!     .email("inbox@example.com")
//!     .password("app-password")  // app-specific password for Gmail/Outlook
//!     .expected_recipient("inbox+signup@example.com")
//!     .build()?;
//!
//! let mut watcher = InboxWatcher::connect(config).await?;
//!
//! // Trigger the email elsewhere, then wait for it to land.
//! match watcher.wait_for_new_message().await? {
//!     Some(message) => {
//!         let code = message.extract(&CodeExtractor::six_digit());
//!         println!("delivered, code: {code:?}");
//!     }
//!     None => println!("no delivery within the wait budget"),
//! }
//!
//! watcher.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Recipient aliasing
//!
//! Signup flows often register `inbox+something@domain` while the mailbox is
//! `inbox@domain`. The recipient filter strips `+tag` suffixes from local
//! parts on both sides before comparing, so either spelling of
//! `expected_recipient` matches either delivery. Domains are compared
//! verbatim.
//!
//! ## Waiting semantics
//!
//! [`InboxWatcher::wait_for_new_message`] has exactly two ordinary outcomes:
//! `Ok(Some(message))` for a qualifying delivery and `Ok(None)` when the wait
//! budget elapses. Transient server failures and unparseable messages are
//! retried until the budget runs out; only non-transient errors surface as
//! `Err`. The poll interval and wait budget default to 5 and 60 seconds and
//! are configurable through the builder.
//!
//! A watcher instance is single-caller: polling takes `&mut self`, and each
//! watcher owns its session and cursor. Run independent watchers for
//! concurrent mailboxes.
//!
//! ## Custom mail stores
//!
//! The polling engine reads mail through the [`MailSource`] trait. Production
//! uses the built-in IMAP implementation; tests or exotic backends can
//! implement the trait themselves.
//!
//! ## Features
//!
//! - **`observability`**: pulls in OpenTelemetry integration for the
//!   `tracing` spans this crate emits. Spans are emitted (and cheap)
//!   either way.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extract;
pub mod source;

// Internal modules
mod arrival;
mod connection;
mod cursor;
mod message;
mod parser;
mod poll;
mod recipient;
mod servers;
mod session;
mod watcher;

// Re-exports for ergonomic API
pub use config::{PollingConfig, TimeoutConfig, WatchConfig, WatchConfigBuilder};
pub use connection::{ProxyAuth, Socks5Proxy};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use extract::{CodeExtractor, Extractor, PatternExtractor};
pub use message::FetchedMessage;
pub use source::{Criterion, MailSource};
pub use watcher::{InboxWatcher, InboxWatcherGuard};
