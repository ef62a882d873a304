//! The mailbox-store seam the polling engine is written against.
//!
//! The engine never speaks IMAP itself; it asks a [`MailSource`] for
//! "identifiers matching a criterion" and "the raw message for an
//! identifier". Production uses [`ImapSource`]; tests inject scripted
//! sources.

use async_trait::async_trait;

use crate::config::TimeoutConfig;
use crate::error::{Error, Result};
use crate::session::{self, ImapSession};

/// Query expression passed to a mail store's listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Every identifier currently in the mailbox.
    All,
    /// Identifiers strictly greater than the given one.
    After(u32),
}

impl Criterion {
    /// Renders the criterion as an IMAP UID SEARCH query.
    #[must_use]
    pub fn query(&self) -> String {
        match self {
            Criterion::All => "ALL".to_owned(),
            Criterion::After(uid) => format!("UID {}:*", uid.saturating_add(1)),
        }
    }
}

/// Access to a mailbox store, reduced to the two operations the polling
/// engine needs.
///
/// Implementations must return identifiers in ascending order so that the
/// last element is the newest message. Absence of candidates is an empty
/// vector, not an error.
#[async_trait]
pub trait MailSource: Send {
    /// Lists message identifiers matching `criterion`, ascending.
    async fn list_uids(&mut self, criterion: &Criterion) -> Result<Vec<u32>>;

    /// Fetches the complete raw message for `uid`.
    async fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>>;
}

/// Production [`MailSource`] backed by an authenticated IMAP session.
///
/// Each operation is bounded by the corresponding [`TimeoutConfig`] entry so
/// a stalled server surfaces as a retryable timeout instead of hanging the
/// watcher indefinitely.
pub struct ImapSource {
    pub(crate) session: Box<ImapSession>,
    pub(crate) timeouts: TimeoutConfig,
}

impl ImapSource {
    pub(crate) fn new(session: ImapSession, timeouts: TimeoutConfig) -> Self {
        Self {
            session: Box::new(session),
            timeouts,
        }
    }
}

#[async_trait]
impl MailSource for ImapSource {
    async fn list_uids(&mut self, criterion: &Criterion) -> Result<Vec<u32>> {
        tokio::time::timeout(
            self.timeouts.search,
            session::search_uids(&mut self.session, criterion),
        )
        .await
        .map_err(|_| Error::SearchTimeout {
            timeout: self.timeouts.search,
        })?
    }

    async fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>> {
        tokio::time::timeout(
            self.timeouts.fetch,
            session::fetch_raw(&mut self.session, uid),
        )
        .await
        .map_err(|_| Error::FetchTimeout {
            uid,
            timeout: self.timeouts.fetch,
        })?
    }
}

impl std::fmt::Debug for ImapSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapSource")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
