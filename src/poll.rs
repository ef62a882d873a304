//! The bounded-retry polling engine.
//!
//! One wait is a sequence of attempts against a fixed start-time threshold.
//! Each attempt asks the cursor for the next criterion, inspects at most the
//! newest candidate, and either yields a qualifying message, reports "nothing
//! yet", or fails. Transient and parse failures are swallowed and retried on
//! the next iteration; anything else aborts the wait.

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::arrival;
use crate::config::PollingConfig;
use crate::cursor::UidCursor;
use crate::error::Result;
use crate::message::FetchedMessage;
use crate::parser;
use crate::recipient::RecipientFilter;
use crate::source::MailSource;

/// Polls until a qualifying message arrives or the wait budget elapses.
///
/// `Ok(None)` means the budget elapsed - a normal negative outcome. The
/// arrival threshold is the wait's start time for every attempt, so a message
/// sent before the wait began never qualifies, no matter when it is
/// inspected. The budget is checked only at loop top; the inter-attempt
/// sleep always runs, so a wait can overshoot by up to one interval.
pub(crate) async fn wait_for_message<S: MailSource>(
    source: &mut S,
    cursor: &mut UidCursor,
    filter: &RecipientFilter,
    polling: &PollingConfig,
) -> Result<Option<FetchedMessage>> {
    let started = Instant::now();
    let threshold = Utc::now().timestamp();

    loop {
        if started.elapsed() > polling.wait_timeout {
            debug!(elapsed = ?started.elapsed(), "Wait budget elapsed without a match");
            return Ok(None);
        }

        match fetch_next_qualifying(source, cursor, filter, threshold).await {
            Ok(Some(message)) => {
                debug!(from = %message.from, subject = %message.subject, "Matched new message");
                return Ok(Some(message));
            }
            Ok(None) => {
                debug!("No qualifying message yet");
            }
            Err(e) if e.retryable_within_poll() => {
                warn!(error = %e, category = %e.category(), "Poll attempt failed, retrying");
            }
            Err(e) => return Err(e),
        }

        tokio::time::sleep(polling.interval).await;
    }
}

/// One polling attempt: inspect the newest unseen message, if any.
///
/// The cursor advances on every non-empty candidate batch, even when the
/// inspected message is filtered out; older candidates in the same batch are
/// permanently skipped. `Ok(None)` covers both "no candidates" and "candidate
/// rejected by a filter"; parse failures (including a malformed `Date:`
/// header) are errors.
pub(crate) async fn fetch_next_qualifying<S: MailSource>(
    source: &mut S,
    cursor: &mut UidCursor,
    filter: &RecipientFilter,
    threshold: i64,
) -> Result<Option<FetchedMessage>> {
    let candidates = source.list_uids(&cursor.criterion()).await?;
    let Some(&newest) = candidates.last() else {
        return Ok(None);
    };
    cursor.advance(newest);

    let raw = source.fetch_raw(newest).await?;
    let parsed = parser::parse_message(&raw)?;

    if !filter.matches(&parsed.to) {
        debug!(uid = newest, to = %parsed.to, "Recipient mismatch");
        return Ok(None);
    }

    let arrived = arrival::parse_date_header(&parsed.date)?;
    if !arrival::arrived_at_or_after(&arrived, threshold) {
        debug!(uid = newest, date = %parsed.date, "Message predates the wait");
        return Ok(None);
    }

    Ok(Some(FetchedMessage {
        from: parsed.from,
        to: parsed.to,
        date: parsed.date,
        subject: parsed.subject,
        content: parsed.content,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::Criterion;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    /// Safely past any test machine's clock, so the arrival gate passes.
    const FUTURE_DATE: &str = "Fri, 01 Jan 2100 00:00:00 +0000";
    const PAST_DATE: &str = "Tue, 01 Jul 2025 12:00:00 +0000";

    enum ListStep {
        Uids(Vec<u32>),
        Fail(Error),
    }

    /// Mock mailbox store: a script of list results plus a UID → blob map.
    #[derive(Default)]
    struct ScriptedSource {
        steps: VecDeque<ListStep>,
        messages: HashMap<u32, Vec<u8>>,
        fetched: Vec<u32>,
        criteria: Vec<Criterion>,
    }

    impl ScriptedSource {
        fn then_uids(mut self, uids: &[u32]) -> Self {
            self.steps.push_back(ListStep::Uids(uids.to_vec()));
            self
        }

        fn then_fail(mut self, error: Error) -> Self {
            self.steps.push_back(ListStep::Fail(error));
            self
        }

        fn with_message(mut self, uid: u32, raw: Vec<u8>) -> Self {
            self.messages.insert(uid, raw);
            self
        }
    }

    #[async_trait]
    impl MailSource for ScriptedSource {
        async fn list_uids(&mut self, criterion: &Criterion) -> Result<Vec<u32>> {
            self.criteria.push(*criterion);
            match self.steps.pop_front() {
                Some(ListStep::Uids(uids)) => Ok(uids),
                Some(ListStep::Fail(error)) => Err(error),
                // Script exhausted: mailbox stays quiet
                None => Ok(Vec::new()),
            }
        }

        async fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>> {
            self.fetched.push(uid);
            self.messages
                .get(&uid)
                .cloned()
                .ok_or(Error::EmptyFetch { uid })
        }
    }

    fn raw_message(to: &str, date: &str, body: &str) -> Vec<u8> {
        format!(
            "From: Notifications <noreply@service.test>\r\nTo: {to}\r\n\
             Subject: Your code\r\nDate: {date}\r\n\r\n{body}"
        )
        .into_bytes()
    }

    fn expecting(addr: &str) -> RecipientFilter {
        RecipientFilter::new(Some(addr.to_owned()))
    }

    fn fast_polling() -> PollingConfig {
        PollingConfig {
            interval: Duration::from_secs(1),
            wait_timeout: Duration::from_secs(3),
        }
    }

    // ── fetch_next_qualifying ────────────────────────────────────────────────

    #[tokio::test]
    async fn empty_mailbox_is_no_candidate_and_cursor_stays() {
        let mut source = ScriptedSource::default().then_uids(&[]);
        let mut cursor = UidCursor::new(Some(12));

        let result =
            fetch_next_qualifying(&mut source, &mut cursor, &RecipientFilter::new(None), 0)
                .await
                .unwrap();

        assert!(result.is_none());
        assert_eq!(cursor.last_seen(), Some(12));
        assert!(source.fetched.is_empty());
    }

    #[tokio::test]
    async fn only_the_newest_candidate_is_inspected() {
        let mut source = ScriptedSource::default()
            .then_uids(&[4, 5, 6])
            .with_message(6, raw_message("user@example.com", FUTURE_DATE, "code 111222"));
        let mut cursor = UidCursor::new(None);

        let message =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await
                .unwrap()
                .expect("newest candidate qualifies");

        assert_eq!(source.fetched, vec![6]);
        assert_eq!(cursor.last_seen(), Some(6));
        assert_eq!(message.to, "user@example.com");
        assert!(message.content.contains("111222"));
    }

    #[tokio::test]
    async fn rejected_message_still_advances_the_cursor() {
        let mut source = ScriptedSource::default()
            .then_uids(&[8, 9])
            .with_message(9, raw_message("other@example.com", FUTURE_DATE, "hi"));
        let mut cursor = UidCursor::new(None);

        let result =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await
                .unwrap();

        assert!(result.is_none());
        // 8 and 9 are both permanently skipped now
        assert_eq!(cursor.last_seen(), Some(9));
        assert_eq!(cursor.criterion(), Criterion::After(9));
    }

    #[tokio::test]
    async fn aliased_recipient_matches() {
        let mut source = ScriptedSource::default()
            .then_uids(&[3])
            .with_message(3, raw_message("Name <user+run7@example.com>", FUTURE_DATE, "ok"));
        let mut cursor = UidCursor::new(None);

        let message =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await
                .unwrap();

        assert!(message.is_some());
    }

    #[tokio::test]
    async fn missing_to_header_is_a_mismatch_when_filtered() {
        let raw = format!(
            "From: noreply@service.test\r\nSubject: hi\r\nDate: {FUTURE_DATE}\r\n\r\nbody"
        )
        .into_bytes();
        let mut source = ScriptedSource::default().then_uids(&[3]).with_message(3, raw);
        let mut cursor = UidCursor::new(None);

        let result =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await
                .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn stale_message_is_gated_out() {
        let stale = crate::arrival::parse_date_header(PAST_DATE).unwrap().timestamp();
        let mut source = ScriptedSource::default()
            .then_uids(&[5])
            .with_message(5, raw_message("user@example.com", PAST_DATE, "late"));
        let mut cursor = UidCursor::new(None);

        let result = fetch_next_qualifying(
            &mut source,
            &mut cursor,
            &expecting("user@example.com"),
            stale + 1,
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert_eq!(cursor.last_seen(), Some(5));
    }

    #[tokio::test]
    async fn message_dated_exactly_at_threshold_passes() {
        let exact = crate::arrival::parse_date_header(PAST_DATE).unwrap().timestamp();
        let mut source = ScriptedSource::default()
            .then_uids(&[5])
            .with_message(5, raw_message("user@example.com", PAST_DATE, "on time"));
        let mut cursor = UidCursor::new(None);

        let result = fetch_next_qualifying(
            &mut source,
            &mut cursor,
            &expecting("user@example.com"),
            exact,
        )
        .await
        .unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn malformed_date_is_a_hard_error_for_the_attempt() {
        let mut source = ScriptedSource::default()
            .then_uids(&[5])
            .with_message(5, raw_message("user@example.com", "not a date", "hi"));
        let mut cursor = UidCursor::new(None);

        let result =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await;

        assert!(matches!(result, Err(Error::MalformedDate { .. })));
    }

    #[tokio::test]
    async fn recipient_mismatch_wins_over_a_malformed_date() {
        // Filters run in order: a message for someone else is "no match" even
        // when its date would not parse.
        let mut source = ScriptedSource::default()
            .then_uids(&[5])
            .with_message(5, raw_message("other@example.com", "not a date", "hi"));
        let mut cursor = UidCursor::new(None);

        let result =
            fetch_next_qualifying(&mut source, &mut cursor, &expecting("user@example.com"), 0)
                .await
                .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn next_attempt_excludes_the_previous_batch() {
        let mut source = ScriptedSource::default()
            .then_uids(&[4, 5])
            .with_message(5, raw_message("other@example.com", FUTURE_DATE, "miss"))
            .then_uids(&[6])
            .with_message(6, raw_message("user@example.com", FUTURE_DATE, "hit"));
        let mut cursor = UidCursor::new(None);
        let filter = expecting("user@example.com");

        let first = fetch_next_qualifying(&mut source, &mut cursor, &filter, 0)
            .await
            .unwrap();
        assert!(first.is_none());

        let second = fetch_next_qualifying(&mut source, &mut cursor, &filter, 0)
            .await
            .unwrap();
        assert!(second.is_some());

        assert_eq!(source.criteria, vec![Criterion::All, Criterion::After(5)]);
    }

    // ── wait_for_message ─────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn quiet_mailbox_times_out_within_one_interval_past_the_budget() {
        let mut source = ScriptedSource::default();
        let mut cursor = UidCursor::new(None);
        let polling = fast_polling();

        let started = Instant::now();
        let result = wait_for_message(
            &mut source,
            &mut cursor,
            &RecipientFilter::new(None),
            &polling,
        )
        .await
        .unwrap();
        let elapsed = started.elapsed();

        assert!(result.is_none());
        assert!(elapsed >= polling.wait_timeout, "stopped early: {elapsed:?}");
        assert!(
            elapsed <= polling.wait_timeout + polling.interval + Duration::from_millis(50),
            "overshot: {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn match_on_a_later_attempt_returns_before_the_budget() {
        let mut source = ScriptedSource::default()
            .then_uids(&[])
            .then_uids(&[10])
            .with_message(10, raw_message("user@example.com", FUTURE_DATE, "code 424242"));
        let mut cursor = UidCursor::new(None);
        let polling = fast_polling();

        let started = Instant::now();
        let message = wait_for_message(
            &mut source,
            &mut cursor,
            &expecting("user@example.com"),
            &polling,
        )
        .await
        .unwrap()
        .expect("second attempt matches");

        assert!(message.content.contains("424242"));
        assert!(started.elapsed() < polling.wait_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn parse_error_does_not_abort_the_wait() {
        let mut source = ScriptedSource::default()
            .then_uids(&[5])
            .with_message(5, raw_message("user@example.com", "garbled date", "bad"))
            .then_uids(&[6])
            .with_message(6, raw_message("user@example.com", FUTURE_DATE, "code 987654"));
        let mut cursor = UidCursor::new(None);

        let message = wait_for_message(
            &mut source,
            &mut cursor,
            &expecting("user@example.com"),
            &fast_polling(),
        )
        .await
        .unwrap()
        .expect("recovers after the parse failure");

        assert!(message.content.contains("987654"));
        // The broken message was passed over for good
        assert_eq!(source.criteria, vec![Criterion::All, Criterion::After(5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let mut source = ScriptedSource::default()
            .then_fail(Error::SearchTimeout {
                timeout: Duration::from_secs(10),
            })
            .then_uids(&[7])
            .with_message(7, raw_message("user@example.com", FUTURE_DATE, "recovered"));
        let mut cursor = UidCursor::new(None);

        let message = wait_for_message(
            &mut source,
            &mut cursor,
            &expecting("user@example.com"),
            &fast_polling(),
        )
        .await
        .unwrap();

        assert!(message.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_aborts_the_wait() {
        let mut source = ScriptedSource::default().then_fail(Error::InvalidConfig {
            message: "broken".into(),
        });
        let mut cursor = UidCursor::new(None);

        let result = wait_for_message(
            &mut source,
            &mut cursor,
            &RecipientFilter::new(None),
            &fast_polling(),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
