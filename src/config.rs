//! Configuration for the mailbox watcher.
//!
//! Use [`WatchConfigBuilder`] to create a configuration with sensible
//! defaults:
//!
//! ```
//! use email_watch::WatchConfig;
//!
//! let config = WatchConfig::builder()
//!     .email("user@example.com")
//!     .password("app-password")
//!     .expected_recipient("signup+run42@example.com")
//!     .build()
//!     .expect("valid config");
//! ```

use std::time::Duration;

use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};

use crate::connection::Socks5Proxy;
use crate::error::{Error, Result};
use crate::servers;

/// Configuration for connecting to and watching a mailbox.
///
/// Create using [`WatchConfig::builder()`].
///
/// The `password` field is stored as a [`SecretString`] to prevent accidental
/// logging of credentials; the `email` field is validated at build time.
#[derive(Clone)]
pub struct WatchConfig {
    /// Login email address, also used for IMAP host discovery.
    email: EmailAddress,
    /// Account password or app-specific password.
    password: SecretString,
    /// Only messages addressed to this recipient qualify; `None` disables
    /// recipient filtering.
    pub expected_recipient: Option<String>,
    /// IMAP server hostname (discovered from the email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Optional SOCKS5 proxy for the connection.
    pub proxy: Option<Socks5Proxy>,
    /// Per-operation timeouts.
    pub timeouts: TimeoutConfig,
    /// Poll cadence and wait budget.
    pub polling: PollingConfig,
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("expected_recipient", &self.expected_recipient)
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("proxy", &self.proxy)
            .field("timeouts", &self.timeouts)
            .field("polling", &self.polling)
            .finish()
    }
}

impl WatchConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> WatchConfigBuilder {
        WatchConfigBuilder::default()
    }

    /// Returns the login email address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password as a string slice.
    ///
    /// The password is intentionally not a public field so it cannot end up
    /// in logs by accident.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The effective IMAP host: explicitly configured, or discovered from the
    /// email domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        self.imap_host
            .clone()
            .unwrap_or_else(|| servers::imap_host_for(self.email.as_str()))
    }

    /// The full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Per-operation timeouts for IMAP round-trips.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for a UID search.
    pub search: Duration,
    /// Timeout for fetching one message.
    pub fetch: Duration,
    /// Timeout for the logout exchange.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Poll cadence and overall wait budget.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Sleep between polling attempts.
    pub interval: Duration,
    /// Overall budget for one wait operation; elapsing it is a normal
    /// negative outcome, not an error.
    pub wait_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            wait_timeout: Duration::from_secs(60),
        }
    }
}

fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_owned(),
        }
    })
}

/// Builder for [`WatchConfig`].
#[derive(Debug, Default)]
pub struct WatchConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    expected_recipient: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    proxy: Option<Socks5Proxy>,
    timeouts: Option<TimeoutConfig>,
    polling: Option<PollingConfig>,
}

impl WatchConfigBuilder {
    /// Sets the login email address (required).
    ///
    /// The domain is also used to discover the IMAP host when none is set
    /// explicitly.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password (required).
    ///
    /// For Gmail/Outlook, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Restricts matching to messages addressed to this recipient.
    ///
    /// The comparison strips `+tag` aliases from local parts, so an expected
    /// `user@x.com` matches a delivery to `user+signup@x.com` and vice versa.
    /// Without this, any new message qualifies.
    #[must_use]
    pub fn expected_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.expected_recipient = Some(recipient.into());
        self
    }

    /// Sets the IMAP server hostname explicitly, bypassing discovery.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993 (IMAPS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Routes the connection through a SOCKS5 proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Socks5Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets all per-operation timeouts at once.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the polling configuration at once.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the sleep between polling attempts (default 5 s).
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the overall wait budget (default 60 s).
    #[must_use]
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .wait_timeout = timeout;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, or if the email or
    /// expected recipient is not a syntactically valid address.
    pub fn build(self) -> Result<WatchConfig> {
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;
        let email = validate_email(&email_raw)?;

        let password = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        // A typo'd recipient filter would otherwise silently match nothing
        // until the wait times out.
        if let Some(recipient) = &self.expected_recipient {
            validate_email(recipient)?;
        }

        Ok(WatchConfig {
            email,
            password: SecretString::from(password),
            expected_recipient: self.expected_recipient,
            imap_host: self.imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            proxy: self.proxy,
            timeouts: self.timeouts.unwrap_or_default(),
            polling: self.polling.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_minimal() {
        let config = WatchConfig::builder()
            .email("user@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.email(), "user@example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.imap_port, 993);
        assert!(config.expected_recipient.is_none());
        assert!(config.proxy.is_none());
    }

    #[test]
    fn polling_defaults_match_the_documented_surface() {
        let config = WatchConfig::builder()
            .email("user@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.polling.interval, Duration::from_secs(5));
        assert_eq!(config.polling.wait_timeout, Duration::from_secs(60));
    }

    #[test]
    fn builder_full() {
        let config = WatchConfig::builder()
            .email("user@example.com")
            .password("secret")
            .expected_recipient("user+signup@example.com")
            .imap_host("mail.example.com")
            .imap_port(994)
            .proxy(Socks5Proxy::new("proxy.local", 1080))
            .connect_timeout(Duration::from_secs(60))
            .poll_interval(Duration::from_secs(2))
            .wait_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(
            config.expected_recipient.as_deref(),
            Some("user+signup@example.com")
        );
        assert_eq!(config.imap_host, Some("mail.example.com".into()));
        assert_eq!(config.imap_port, 994);
        assert!(config.proxy.is_some());
        assert_eq!(config.timeouts.connect, Duration::from_secs(60));
        assert_eq!(config.polling.interval, Duration::from_secs(2));
        assert_eq!(config.polling.wait_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_required_fields_fail() {
        assert!(WatchConfig::builder().password("secret").build().is_err());
        assert!(WatchConfig::builder()
            .email("user@example.com")
            .build()
            .is_err());
    }

    #[test]
    fn invalid_email_fails() {
        let result = WatchConfig::builder()
            .email("not-an-email")
            .password("secret")
            .build();
        assert!(matches!(result, Err(Error::InvalidEmailFormat { .. })));
    }

    #[test]
    fn invalid_expected_recipient_fails() {
        let result = WatchConfig::builder()
            .email("user@example.com")
            .password("secret")
            .expected_recipient("not-an-email")
            .build();
        assert!(matches!(result, Err(Error::InvalidEmailFormat { .. })));
    }

    #[test]
    fn host_discovery_and_explicit_override() {
        let discovered = WatchConfig::builder()
            .email("user@gmail.com")
            .password("secret")
            .build()
            .unwrap();
        assert_eq!(discovered.effective_imap_host(), "imap.gmail.com");

        let explicit = WatchConfig::builder()
            .email("user@gmail.com")
            .password("secret")
            .imap_host("custom.host.com")
            .build()
            .unwrap();
        assert_eq!(explicit.effective_imap_host(), "custom.host.com");
        assert_eq!(explicit.server_address(), "custom.host.com:993");
    }

    #[test]
    fn password_not_in_debug() {
        let config = WatchConfig::builder()
            .email("user@example.com")
            .password("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
