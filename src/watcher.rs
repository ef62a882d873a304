//! The mailbox watcher: public entry point of this crate.
//!
//! An [`InboxWatcher`] owns one authenticated IMAP session and one cursor
//! over that mailbox. It is deliberately `&mut self` throughout: one watcher
//! serves one caller at a time, and concurrent polling requires separate
//! watcher instances.
//!
//! # Example
//!
//! ```no_run
//! use email_watch::{InboxWatcher, WatchConfig};
//!
//! # async fn example() -> email_watch::Result<()> {
//! let config = WatchConfig::builder()
//!     .email("inbox@example.com")
//!     .password("app-password")
//!     .expected_recipient("inbox+signup@example.com")
//!     .build()?;
//!
//! let mut watcher = InboxWatcher::connect(config).await?;
//!
//! match watcher.wait_for_new_message().await? {
//!     Some(message) => println!("delivered: {}", message.subject),
//!     None => println!("nothing arrived within the wait budget"),
//! }
//!
//! watcher.logout().await?;
//! # Ok(())
//! # }
//! ```

use tracing::{debug, instrument, warn};

use crate::config::WatchConfig;
use crate::connection;
use crate::cursor::UidCursor;
use crate::error::{Error, Result};
use crate::message::FetchedMessage;
use crate::poll;
use crate::recipient::RecipientFilter;
use crate::session;
use crate::source::ImapSource;

const MAILBOX: &str = "INBOX";

/// Watches one mailbox for the arrival of a new, matching message.
///
/// Create with [`connect`](Self::connect); the watcher remembers the highest
/// UID present at that moment and only ever reports mail that arrives after
/// it. Call [`logout`](Self::logout) when done, or use
/// [`into_guard`](Self::into_guard) for scope-bound cleanup.
pub struct InboxWatcher {
    source: ImapSource,
    cursor: UidCursor,
    filter: RecipientFilter,
    config: WatchConfig,
}

impl InboxWatcher {
    /// Connects, authenticates, selects the INBOX and positions the cursor at
    /// the newest message currently present.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, credentials
    /// are rejected, the mailbox cannot be selected, or any of those steps
    /// exceeds its configured timeout.
    #[instrument(
        name = "InboxWatcher::connect",
        skip_all,
        fields(
            email = %config.email(),
            imap_host = %config.effective_imap_host(),
            proxy_enabled = config.proxy.is_some()
        )
    )]
    pub async fn connect(config: WatchConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.server_address();
        let timeouts = &config.timeouts;

        let tls_stream = tokio::time::timeout(
            timeouts.connect,
            connection::establish_tls(&imap_host, &target_addr, config.proxy.as_ref()),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let mut imap_session = tokio::time::timeout(
            timeouts.auth,
            session::authenticate(tls_stream, config.email(), config.password()),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            email: config.email().to_owned(),
            timeout: timeouts.auth,
        })??;

        debug!("Authenticated");

        tokio::time::timeout(
            timeouts.select,
            session::select_mailbox(&mut imap_session, MAILBOX),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: MAILBOX.to_owned(),
            timeout: timeouts.select,
        })??;

        debug!("Selected {MAILBOX}");

        let initial_uid = tokio::time::timeout(
            timeouts.search,
            session::latest_uid(&mut imap_session),
        )
        .await
        .map_err(|_| Error::SearchTimeout {
            timeout: timeouts.search,
        })??;

        debug!(?initial_uid, "Watcher connected and positioned");

        Ok(Self {
            source: ImapSource::new(imap_session, timeouts.clone()),
            cursor: UidCursor::new(initial_uid),
            filter: RecipientFilter::new(config.expected_recipient.clone()),
            config,
        })
    }

    /// Waits for a new message addressed to the expected recipient, arriving
    /// after this call starts.
    ///
    /// Polls at the configured interval until the wait budget elapses.
    /// `Ok(None)` means nothing qualifying arrived in time, which is a normal
    /// outcome, typically meaning the delivery being confirmed did not
    /// happen. Transient server trouble and unparseable messages are retried
    /// silently until the budget runs out.
    ///
    /// # Errors
    ///
    /// Returns an error only for non-transient failures, such as a
    /// configuration problem surfacing mid-wait.
    #[instrument(
        name = "InboxWatcher::wait_for_new_message",
        skip(self),
        fields(
            expected_recipient = ?self.config.expected_recipient,
            wait_timeout_secs = self.config.polling.wait_timeout.as_secs()
        )
    )]
    pub async fn wait_for_new_message(&mut self) -> Result<Option<FetchedMessage>> {
        poll::wait_for_message(
            &mut self.source,
            &mut self.cursor,
            &self.filter,
            &self.config.polling,
        )
        .await
    }

    /// Logs out from the IMAP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout exchange fails or times out; the
    /// connection is dropped either way.
    #[instrument(name = "InboxWatcher::logout", skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        let timeout = self.config.timeouts.logout;

        tokio::time::timeout(timeout, session::logout(&mut self.source.session))
            .await
            .map_err(|_| Error::LogoutTimeout { timeout })?
    }

    /// Converts this watcher into a guard that logs out on drop.
    #[must_use]
    pub fn into_guard(self) -> InboxWatcherGuard {
        InboxWatcherGuard { inner: Some(self) }
    }

    /// Returns the email address of the watched account.
    #[must_use]
    pub fn email(&self) -> &str {
        self.config.email()
    }

    /// Returns the IMAP host this watcher is connected to.
    #[must_use]
    pub fn imap_host(&self) -> String {
        self.config.effective_imap_host()
    }
}

impl std::fmt::Debug for InboxWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxWatcher")
            .field("email", &self.config.email())
            .field("imap_host", &self.config.effective_imap_host())
            .field("last_seen_uid", &self.cursor.last_seen())
            .finish_non_exhaustive()
    }
}

/// RAII guard for [`InboxWatcher`] that logs out on drop.
///
/// Created by [`InboxWatcher::into_guard`]. Dropping the guard inside a tokio
/// runtime spawns a best-effort logout; outside a runtime the connection is
/// closed without the IMAP goodbye.
#[derive(Debug)]
pub struct InboxWatcherGuard {
    inner: Option<InboxWatcher>,
}

impl InboxWatcherGuard {
    /// Waits for a new matching message. See
    /// [`InboxWatcher::wait_for_new_message`].
    ///
    /// # Panics
    ///
    /// Panics if the guard has already been consumed by
    /// [`logout`](Self::logout).
    ///
    /// # Errors
    ///
    /// Returns an error for non-transient failures during the wait.
    pub async fn wait_for_new_message(&mut self) -> Result<Option<FetchedMessage>> {
        self.inner
            .as_mut()
            .expect("guard already consumed")
            .wait_for_new_message()
            .await
    }

    /// Explicitly logs out and consumes the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout exchange fails.
    pub async fn logout(mut self) -> Result<()> {
        match self.inner.take() {
            Some(mut watcher) => watcher.logout().await,
            None => Ok(()),
        }
    }

    /// Returns the email address of the watched account.
    ///
    /// # Panics
    ///
    /// Panics if the guard has already been consumed by
    /// [`logout`](Self::logout).
    #[must_use]
    pub fn email(&self) -> &str {
        self.inner.as_ref().expect("guard already consumed").email()
    }
}

impl Drop for InboxWatcherGuard {
    fn drop(&mut self) {
        let Some(mut watcher) = self.inner.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match watcher.logout().await {
                        Ok(()) => debug!("Watcher logged out on drop"),
                        Err(e) => warn!(error = %e, "Watcher logout on drop failed"),
                    }
                });
            }
            Err(_) => {
                warn!(
                    "InboxWatcherGuard dropped outside a tokio runtime; connection closed \
                     without IMAP logout. Call .logout().await explicitly to avoid this."
                );
            }
        }
    }
}
