//! Internal IMAP session operations.
//!
//! Thin wrappers around async-imap with per-operation error mapping. The
//! watcher composes these; timeouts are applied one level up.

use futures::StreamExt;
use tracing::debug;

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use crate::source::Criterion;

/// Type alias for an IMAP session over TLS.
pub(crate) type ImapSession = async_imap::Session<TlsStream>;

/// Authenticates against the IMAP server and returns a session.
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    email: &str,
    password: &str,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!(email, "Authenticating to IMAP server");

    client.login(email, password).await.map_err(|e| Error::Login {
        email: email.to_owned(),
        source: e.0,
    })
}

/// Selects a mailbox (typically "INBOX").
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!(mailbox, "Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_owned(),
            source,
        })?;

    Ok(())
}

/// Returns the highest UID currently present, or `None` for an empty mailbox.
pub(crate) async fn latest_uid(session: &mut ImapSession) -> Result<Option<u32>> {
    // NOOP so the search sees current mailbox state
    session.noop().await.map_err(|source| Error::Noop { source })?;

    let uids = session
        .uid_search("ALL")
        .await
        .map_err(|source| Error::Search {
            query: "ALL".to_owned(),
            source,
        })?;

    let max_uid = uids.iter().max().copied();

    debug!(?max_uid, uid_count = uids.len(), "Queried latest UID");

    Ok(max_uid)
}

/// Lists UIDs matching the criterion, ascending.
pub(crate) async fn search_uids(
    session: &mut ImapSession,
    criterion: &Criterion,
) -> Result<Vec<u32>> {
    session.noop().await.map_err(|source| Error::Noop { source })?;

    let query = criterion.query();
    let uids = session
        .uid_search(&query)
        .await
        .map_err(|source| Error::Search {
            query: query.clone(),
            source,
        })?;

    // "UID x:*" always matches the newest message, even when its UID is
    // below x; enforce the strictly-greater contract here.
    let mut uids: Vec<u32> = match criterion {
        Criterion::After(last_seen) => uids.into_iter().filter(|uid| uid > last_seen).collect(),
        Criterion::All => uids.into_iter().collect(),
    };
    uids.sort_unstable();

    debug!(query = %query, uid_count = uids.len(), "Searched for candidate UIDs");

    Ok(uids)
}

/// Fetches the complete raw message for a single UID.
pub(crate) async fn fetch_raw(session: &mut ImapSession, uid: u32) -> Result<Vec<u8>> {
    debug!(uid, "Fetching message");

    let mut stream = session
        .uid_fetch(uid.to_string(), "BODY[]")
        .await
        .map_err(|source| Error::Fetch { uid, source })?;

    let mut raw = None;
    while let Some(item) = stream.next().await {
        let fetch = item.map_err(|source| Error::Fetch { uid, source })?;
        if let Some(body) = fetch.body() {
            raw = Some(body.to_vec());
        }
    }

    raw.ok_or(Error::EmptyFetch { uid })
}

/// Logs out from the IMAP session.
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::Logout { source })?;

    Ok(())
}
