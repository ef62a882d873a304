//! Recipient-address matching with provider alias stripping.
//!
//! Automated signup flows commonly register `user+something@domain` while the
//! mailbox itself is `user@domain`. Comparison therefore strips everything
//! from the first `+` in the local part before comparing, on both sides.
//! Domains are compared verbatim and case-sensitively; the aliasing
//! convention applies to local parts only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the first angle-bracket-delimited address in a header value,
/// e.g. the `user@x.com` inside `"Some Name <user@x.com>"`.
static ANGLE_ADDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>]+)>").expect("valid regex"));

/// Filter deciding whether a message's `To:` header names the expected
/// recipient.
///
/// An unconfigured filter matches every header value, including an absent
/// one.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecipientFilter {
    expected: Option<String>,
}

impl RecipientFilter {
    /// A filter expecting the given address, or a pass-everything filter for
    /// `None`.
    pub(crate) fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    /// Returns `true` when `to_header` names the expected recipient.
    ///
    /// With a configured expectation, an empty header value is a mismatch, as
    /// is an extracted address without an `@`.
    pub(crate) fn matches(&self, to_header: &str) -> bool {
        let Some(expected) = self.expected.as_deref() else {
            return true;
        };
        if to_header.is_empty() {
            return false;
        }

        // "Name <user@x.com>" carries the address in angle brackets;
        // otherwise the whole value is the address.
        let actual = ANGLE_ADDR
            .captures(to_header)
            .and_then(|caps| caps.get(1))
            .map_or(to_header, |m| m.as_str());

        match (AliasedAddress::parse(expected), AliasedAddress::parse(actual)) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

/// An address reduced to its comparable form: local part with any `+tag`
/// suffix removed, plus the domain as given.
#[derive(Debug, PartialEq, Eq)]
struct AliasedAddress<'a> {
    local: &'a str,
    domain: &'a str,
}

impl<'a> AliasedAddress<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let (local, domain) = raw.split_once('@')?;
        let local = local.split_once('+').map_or(local, |(base, _)| base);
        Some(Self { local, domain })
    }
}
