//! Cursor over mailbox state.
//!
//! The watcher never re-reads old mail: a [`UidCursor`] remembers the highest
//! UID already observed and turns it into the search criterion for the next
//! poll. The cursor is owned by exactly one watcher and lives only as long as
//! the session; nothing is persisted.

use crate::source::Criterion;

/// Highest message UID already observed in the watched mailbox.
///
/// Advancing happens on every non-empty candidate batch, whether or not the
/// inspected message survives the recipient/arrival filters. A message that
/// was listed and filtered out is never re-evaluated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UidCursor {
    last_seen: Option<u32>,
}

impl UidCursor {
    /// Creates a cursor positioned at the given UID, or at the start of the
    /// mailbox when it is empty (`None`).
    pub(crate) fn new(last_seen: Option<u32>) -> Self {
        Self { last_seen }
    }

    /// The criterion selecting only mail this cursor has not observed yet.
    pub(crate) fn criterion(&self) -> Criterion {
        match self.last_seen {
            Some(uid) => Criterion::After(uid),
            None => Criterion::All,
        }
    }

    /// Moves the cursor to `uid`. Callers pass the highest UID of a non-empty
    /// candidate batch; an empty batch must leave the cursor untouched by not
    /// calling this at all.
    pub(crate) fn advance(&mut self, uid: u32) {
        self.last_seen = Some(uid);
    }

    pub(crate) fn last_seen(&self) -> Option<u32> {
        self.last_seen
    }
}
