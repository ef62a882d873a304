//! The message snapshot handed to callers.

use std::borrow::Cow;

use crate::extract::Extractor;

/// Read-only snapshot of a message that passed the recipient and arrival
/// filters.
///
/// All fields carry the header values as the server sent them; `content` is
/// the plain-text body part when the message had one, the top-level content
/// otherwise. The snapshot has no identity beyond its fields and is built
/// once per qualifying fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Raw `From:` header value (empty when absent).
    pub from: String,
    /// Raw `To:` header value (empty when absent).
    pub to: String,
    /// Raw `Date:` header value.
    pub date: String,
    /// Raw `Subject:` header value (empty when absent).
    pub subject: String,
    /// Selected body text.
    pub content: String,
}

impl FetchedMessage {
    /// Runs an [`Extractor`] over the message content.
    ///
    /// # Example
    ///
    /// ```
    /// use email_watch::{CodeExtractor, FetchedMessage};
    ///
    /// let message = FetchedMessage {
    ///     from: "noreply@service.test".into(),
    ///     to: "user@example.com".into(),
    ///     date: "Tue, 01 Jul 2025 12:00:00 +0000".into(),
    ///     subject: "Your code".into(),
    ///     content: "Your verification code is 123456.".into(),
    /// };
    ///
    /// let code = message.extract(&CodeExtractor::six_digit());
    /// assert_eq!(code.as_deref(), Some("123456"));
    /// ```
    #[must_use]
    pub fn extract<'a>(&'a self, extractor: &dyn Extractor) -> Option<Cow<'a, str>> {
        extractor.extract(&self.content)
    }
}
