//! Internal module for decoding raw messages.

use mailparse::{parse_mail, MailHeaderMap, ParsedMail};

use crate::error::{Error, Result};

/// Headers and selected body of a decoded message.
///
/// Absent headers come back as empty strings, never as errors; only a blob
/// that cannot be decoded at all fails.
#[derive(Debug)]
pub(crate) struct ParsedMessage {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) date: String,
    /// Plain-text part when one exists, top-level content otherwise.
    pub(crate) content: String,
}

/// Decodes a raw message blob into headers and body text.
pub(crate) fn parse_message(raw: &[u8]) -> Result<ParsedMessage> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseMessage { source })?;

    let header = |name: &str| parsed.headers.get_first_value(name).unwrap_or_default();

    Ok(ParsedMessage {
        from: header("From"),
        to: header("To"),
        subject: header("Subject"),
        date: header("Date"),
        content: body_text(&parsed)?,
    })
}

/// Selects the message body, preferring a plain-text part anywhere in the
/// part tree and falling back to the top-level content.
fn body_text(parsed: &ParsedMail<'_>) -> Result<String> {
    if let Some(text) = plain_text_part(parsed) {
        return Ok(text);
    }
    parsed
        .get_body()
        .map_err(|source| Error::ExtractBody { source })
}

fn plain_text_part(part: &ParsedMail<'_>) -> Option<String> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        return part.get_body().ok();
    }
    part.subparts.iter().find_map(plain_text_part)
}
