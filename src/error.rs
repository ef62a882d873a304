//! Error types for the email-watch crate.
//!
//! All errors implement [`std::error::Error`] and carry their underlying
//! cause where one exists. Two classifications are exposed:
//! [`Error::is_retryable`] for connection-level retry decisions made by
//! callers, and [`Error::retryable_within_poll`] for the wait loop's own
//! retry policy.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching a mailbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect via SOCKS5 proxy.
    #[error("failed to connect via SOCKS5 proxy {proxy_host} to {target}")]
    Socks5Connect {
        /// The SOCKS5 proxy hostname.
        proxy_host: String,
        /// The target address.
        target: String,
        /// The underlying SOCKS5 error.
        #[source]
        source: tokio_socks::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Per-operation timeouts (RETRYABLE except logout)
    // ─────────────────────────────────────────────────────────────────────────
    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Authentication timeout.
    #[error("authentication timeout for {email} after {timeout:?}")]
    AuthTimeout {
        /// The email address used for authentication.
        email: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Mailbox selection timeout.
    #[error("mailbox selection timeout for '{mailbox}' after {timeout:?}")]
    SelectTimeout {
        /// The mailbox name.
        mailbox: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// UID search timeout.
    #[error("UID search timeout after {timeout:?}")]
    SearchTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Message fetch timeout.
    #[error("message fetch timeout for UID {uid} after {timeout:?}")]
    FetchTimeout {
        /// The UID being fetched.
        uid: u32,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Logout timeout (not critical, the connection is dropped anyway).
    #[error("logout timeout after {timeout:?}")]
    LogoutTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP protocol errors (RETRYABLE - could be transient server issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP login failed.
    #[error("IMAP login failed for {email}")]
    Login {
        /// The email address used for login.
        email: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select mailbox.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP NOOP failed.
    #[error("IMAP NOOP command failed")]
    Noop {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP UID search failed.
    #[error("IMAP search failed for query {query}")]
    Search {
        /// The search query that failed.
        query: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP fetch failed.
    #[error("IMAP fetch failed for UID {uid}")]
    Fetch {
        /// The UID that failed.
        uid: u32,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// The server returned no body for a fetched message.
    #[error("IMAP fetch for UID {uid} returned no message body")]
    EmptyFetch {
        /// The UID whose fetch came back empty.
        uid: u32,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    Logout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Message parsing errors (retried by the poll loop, the cursor has
    // already moved past the offending message)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to decode a raw message into headers and body.
    #[error("failed to parse message")]
    ParseMessage {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// Failed to extract the message body.
    #[error("failed to extract message body")]
    ExtractBody {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    /// The Date header did not match the expected wire format.
    #[error("malformed Date header: {value:?}")]
    MalformedDate {
        /// The raw header value that failed to parse.
        value: String,
        /// The underlying chrono parse error.
        #[source]
        source: chrono::ParseError,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might
    /// succeed on a fresh attempt (reconnect, re-search, re-fetch).
    ///
    /// Parse errors are excluded: malformed content does not change on retry.
    /// The poll loop uses the broader [`Self::retryable_within_poll`] instead,
    /// because there a retry inspects *new* mail rather than the same bytes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::Socks5Connect { .. }
            | Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::SearchTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::Login { .. }
            | Error::SelectMailbox { .. }
            | Error::Noop { .. }
            | Error::Search { .. }
            | Error::Fetch { .. }
            | Error::EmptyFetch { .. } => true,

            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidDnsName { .. }
            | Error::LogoutTimeout { .. }
            | Error::Logout { .. }
            | Error::ParseMessage { .. }
            | Error::ExtractBody { .. }
            | Error::MalformedDate { .. } => false,
        }
    }

    /// Returns `true` if the wait loop should swallow this error and try
    /// again on its next iteration.
    ///
    /// Transient network, timeout and protocol failures qualify, and so do
    /// parse failures: the cursor has already advanced past the message that
    /// failed to parse, so the next attempt inspects different mail.
    /// Configuration errors never qualify and abort the wait.
    #[must_use]
    pub fn retryable_within_poll(&self) -> bool {
        self.is_retryable() || self.category() == ErrorCategory::Parse
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidDnsName { .. } => ErrorCategory::Configuration,

            Error::TcpConnect { .. } | Error::TlsConnect { .. } | Error::Socks5Connect { .. } => {
                ErrorCategory::Network
            }

            Error::ConnectTimeout { .. }
            | Error::AuthTimeout { .. }
            | Error::SelectTimeout { .. }
            | Error::SearchTimeout { .. }
            | Error::FetchTimeout { .. }
            | Error::LogoutTimeout { .. } => ErrorCategory::Timeout,

            Error::Login { .. }
            | Error::SelectMailbox { .. }
            | Error::Noop { .. }
            | Error::Search { .. }
            | Error::Fetch { .. }
            | Error::EmptyFetch { .. }
            | Error::Logout { .. } => ErrorCategory::Protocol,

            Error::ParseMessage { .. }
            | Error::ExtractBody { .. }
            | Error::MalformedDate { .. } => ErrorCategory::Parse,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Per-operation timeout errors.
    Timeout,
    /// IMAP protocol errors.
    Protocol,
    /// Message parsing errors.
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Parse => write!(f, "parse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed_date() -> Error {
        crate::arrival::parse_date_header("garbage").expect_err("garbage must not parse")
    }

    #[test]
    fn retryable_classification() {
        let err = Error::InvalidEmailFormat {
            email: "bad".into(),
        };
        assert!(!err.is_retryable());

        let err = Error::TcpConnect {
            target: "imap.example.com:993".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.is_retryable());

        let err = Error::SearchTimeout {
            timeout: Duration::from_secs(10),
        };
        assert!(err.is_retryable());

        assert!(!malformed_date().is_retryable());
    }

    #[test]
    fn poll_retryability_includes_parse_errors() {
        // Parse failures are swallowed by the wait loop...
        assert!(malformed_date().retryable_within_poll());

        // ...and so are transient protocol errors...
        let err = Error::EmptyFetch { uid: 7 };
        assert!(err.retryable_within_poll());

        // ...but configuration errors abort the wait.
        let err = Error::InvalidConfig {
            message: "missing password".into(),
        };
        assert!(!err.retryable_within_poll());
    }

    #[test]
    fn error_categories() {
        let err = Error::InvalidEmailFormat {
            email: "bad".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = Error::ConnectTimeout {
            target: "imap.example.com:993".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.category(), ErrorCategory::Timeout);

        assert_eq!(malformed_date().category(), ErrorCategory::Parse);
    }
}
