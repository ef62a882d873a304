//! Extracting interesting content from delivered messages.
//!
//! The watcher's job ends at handing back a [`FetchedMessage`]; pulling a
//! verification code or token out of the body is a separate, purely textual
//! step. The built-in extractors cover the two common shapes: a fixed-width
//! numeric code and an arbitrary first-capture-group pattern.
//!
//! [`FetchedMessage`]: crate::FetchedMessage
//!
//! # Example
//!
//! ```
//! use email_watch::{CodeExtractor, Extractor, PatternExtractor};
//!
//! let code = CodeExtractor::six_digit();
//! assert_eq!(code.extract("Your code is 123456.").as_deref(), Some("123456"));
//!
//! let token = PatternExtractor::new(r"token=([a-f0-9]{32})").unwrap();
//! assert_eq!(token.description(), "pattern: token=([a-f0-9]{32})");
//! ```

use std::borrow::Cow;

use regex::Regex;

/// Extracts a value from message body text.
pub trait Extractor: Send + Sync {
    /// Attempts to find and extract the value from `text`.
    ///
    /// `Cow` lets implementations borrow straight from the input when no
    /// transformation is needed.
    fn extract<'a>(&self, text: &'a str) -> Option<Cow<'a, str>>;

    /// Human-readable description, used in logging.
    fn description(&self) -> &str;
}

/// Regex-based extractor returning the first capture group.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    regex: Regex,
    description: String,
}

impl PatternExtractor {
    /// Creates an extractor from a pattern with at least one capture group.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::with_description(pattern, format!("pattern: {pattern}"))
    }

    /// Same as [`Self::new`] with a custom description for logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn with_description(
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            description: description.into(),
        })
    }
}

impl Extractor for PatternExtractor {
    fn extract<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Cow::Borrowed(m.as_str()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Extractor for fixed-width numeric verification codes.
#[derive(Debug, Clone)]
pub struct CodeExtractor {
    inner: PatternExtractor,
}

impl CodeExtractor {
    /// The common 6-digit verification code.
    #[must_use]
    pub fn six_digit() -> Self {
        Self::n_digit(6)
    }

    /// A code of exactly `digits` digits, delimited by word boundaries.
    ///
    /// # Panics
    ///
    /// Panics if `digits` is 0.
    #[must_use]
    pub fn n_digit(digits: usize) -> Self {
        assert!(digits > 0, "digits must be > 0");
        let pattern = format!(r"\b(\d{{{digits}}})\b");
        Self {
            inner: PatternExtractor::with_description(
                &pattern,
                format!("{digits}-digit code"),
            )
            .expect("valid regex"),
        }
    }
}

impl Extractor for CodeExtractor {
    fn extract<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.inner.extract(text)
    }

    fn description(&self) -> &str {
        self.inner.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_extractor_returns_first_capture() {
        let extractor = PatternExtractor::new(r"code:\s*(\d+)").unwrap();
        assert_eq!(extractor.extract("Your code: 12345").as_deref(), Some("12345"));
        assert_eq!(extractor.extract("no code here"), None);
    }

    #[test]
    fn pattern_extractor_borrows_from_input() {
        let extractor = PatternExtractor::new(r"(\w+)!").unwrap();
        let result = extractor.extract("done!");
        assert!(matches!(result, Some(Cow::Borrowed(_))));
    }

    #[test]
    fn six_digit_code() {
        let code = CodeExtractor::six_digit();
        assert_eq!(code.extract("Your code is 123456.").as_deref(), Some("123456"));
        assert_eq!(code.extract("Code: 12345"), None); // 5 digits
        assert_eq!(code.extract("Code: 1234567"), None); // 7 digits
    }

    #[test]
    fn n_digit_code() {
        let pin = CodeExtractor::n_digit(4);
        assert_eq!(pin.extract("PIN: 1234").as_deref(), Some("1234"));
        assert_eq!(pin.extract("PIN: 12345"), None);
        assert_eq!(pin.description(), "4-digit code");
    }
}
