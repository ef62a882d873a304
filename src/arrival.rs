//! Arrival gating by message date.
//!
//! The watcher only cares about mail that arrived after it started waiting.
//! Message dates come from the `Date:` header in the fixed wire format
//! `Tue, 01 Jul 2025 12:00:00 +0000`; some servers append a redundant
//! `(UTC)` zone annotation, which is stripped before parsing. A header that
//! does not match the format is a hard error for that message.

use chrono::{DateTime, FixedOffset};

use crate::error::{Error, Result};

/// Weekday, day, month name, 4-digit year, time, numeric zone offset.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Redundant zone annotation some servers append after the numeric offset.
const UTC_ANNOTATION: &str = " (UTC)";

/// Parses a `Date:` header value into a timezone-aware timestamp.
///
/// The offset carried by the header itself is preserved; comparisons happen
/// on the epoch timeline, so mail from any timezone gates correctly.
pub(crate) fn parse_date_header(value: &str) -> Result<DateTime<FixedOffset>> {
    let cleaned = value.strip_suffix(UTC_ANNOTATION).unwrap_or(value);
    DateTime::parse_from_str(cleaned, DATE_FORMAT).map_err(|source| Error::MalformedDate {
        value: value.to_owned(),
        source,
    })
}

/// Returns `true` when the message arrived at or after the threshold.
///
/// Strictly earlier is rejected; exactly-at-threshold passes. Both sides are
/// seconds since the Unix epoch.
pub(crate) fn arrived_at_or_after(message: &DateTime<FixedOffset>, threshold: i64) -> bool {
    message.timestamp() >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Tue, 01 Jul 2025 12:00:00 +0000";

    #[test]
    fn parses_the_wire_format() {
        let parsed = parse_date_header(SAMPLE).unwrap();
        assert_eq!(parsed.to_rfc2822(), "Tue, 1 Jul 2025 12:00:00 +0000");
    }

    #[test]
    fn utc_annotation_suffix_is_ignored() {
        let bare = parse_date_header(SAMPLE).unwrap();
        let annotated = parse_date_header("Tue, 01 Jul 2025 12:00:00 +0000 (UTC)").unwrap();
        assert_eq!(bare, annotated);
    }

    #[test]
    fn offsets_normalize_onto_the_epoch_timeline() {
        let utc = parse_date_header(SAMPLE).unwrap();
        let shifted = parse_date_header("Tue, 01 Jul 2025 14:00:00 +0200").unwrap();
        assert_eq!(utc.timestamp(), shifted.timestamp());
    }

    #[test]
    fn malformed_dates_are_hard_errors() {
        assert!(matches!(
            parse_date_header("yesterday-ish"),
            Err(Error::MalformedDate { .. })
        ));
        // ISO form is not the wire format
        assert!(parse_date_header("2025-07-01T12:00:00Z").is_err());
        assert!(parse_date_header("").is_err());
    }

    #[test]
    fn gate_passes_at_the_threshold_and_later() {
        let message = parse_date_header(SAMPLE).unwrap();
        let at = message.timestamp();
        assert!(arrived_at_or_after(&message, at));
        assert!(arrived_at_or_after(&message, at - 60));
    }

    #[test]
    fn gate_rejects_one_second_earlier() {
        let message = parse_date_header(SAMPLE).unwrap();
        let threshold = message.timestamp() + 1;
        assert!(!arrived_at_or_after(&message, threshold));
    }
}
