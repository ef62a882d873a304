//! TLS connection establishment, directly or through a SOCKS5 proxy.

use std::sync::Arc;

use rustls::ClientConfig;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_socks::tcp::Socks5Stream;
use tracing::debug;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::error::{Error, Result};

/// A TLS stream over TCP, used for IMAP communication.
pub(crate) type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// SOCKS5 proxy configuration.
///
/// # Example
///
/// ```
/// use email_watch::Socks5Proxy;
///
/// let plain = Socks5Proxy::new("proxy.example.com", 1080);
/// let authed = Socks5Proxy::with_auth("proxy.example.com", 1080, "user", "pass");
/// assert!(!plain.requires_auth());
/// assert!(authed.requires_auth());
/// ```
#[derive(Debug, Clone)]
pub struct Socks5Proxy {
    /// Proxy server hostname or IP address.
    pub host: String,
    /// Proxy server port.
    pub port: u16,
    /// Optional authentication credentials.
    pub auth: Option<ProxyAuth>,
}

/// Authentication credentials for a SOCKS5 proxy.
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    /// Username for proxy authentication.
    pub username: String,
    /// Password for proxy authentication.
    pub password: String,
}

impl Socks5Proxy {
    /// Proxy without authentication.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Proxy with username/password authentication.
    #[must_use]
    pub fn with_auth(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            auth: Some(ProxyAuth {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Returns `true` if this proxy requires authentication.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }
}

impl std::fmt::Display for Socks5Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.auth {
            Some(auth) => write!(
                f,
                "socks5://{}:***@{}:{}",
                auth.username, self.host, self.port
            ),
            None => write!(f, "socks5://{}:{}", self.host, self.port),
        }
    }
}

/// Establishes a TLS connection to `target_addr`, routed through SOCKS5 when
/// a proxy is configured. `imap_host` is the SNI name.
pub(crate) async fn establish_tls(
    imap_host: &str,
    target_addr: &str,
    proxy: Option<&Socks5Proxy>,
) -> Result<TlsStream> {
    let server_name = server_name(imap_host)?;
    let tcp_stream = match proxy {
        Some(proxy) => connect_via_socks5(target_addr, proxy).await?,
        None => connect_direct(target_addr).await?,
    };

    debug!(imap_host, "Performing TLS handshake");

    tls_connector()
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::TlsConnect {
            target: target_addr.to_owned(),
            source,
        })
}

fn tls_connector() -> TlsConnector {
    let mut roots = rustls::RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

fn server_name(host: &str) -> Result<rustls::ServerName> {
    rustls::ServerName::try_from(host).map_err(|source| Error::InvalidDnsName {
        host: host.to_owned(),
        source,
    })
}

async fn connect_direct(target_addr: &str) -> Result<TcpStream> {
    debug!(target = %target_addr, "Establishing direct TCP connection");

    TcpStream::connect(target_addr)
        .await
        .map_err(|source| Error::TcpConnect {
            target: target_addr.to_owned(),
            source,
        })
}

async fn connect_via_socks5(target_addr: &str, proxy: &Socks5Proxy) -> Result<TcpStream> {
    debug!(proxy = %proxy, target = %target_addr, "Connecting via SOCKS5 proxy");

    let proxy_addr = (proxy.host.as_str(), proxy.port);

    let stream = match &proxy.auth {
        Some(auth) => {
            Socks5Stream::connect_with_password(
                proxy_addr,
                target_addr,
                &auth.username,
                &auth.password,
            )
            .await
        }
        None => Socks5Stream::connect(proxy_addr, target_addr).await,
    };

    stream
        .map(Socks5Stream::into_inner)
        .map_err(|source| Error::Socks5Connect {
            proxy_host: proxy.host.clone(),
            target: target_addr.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_server_name_parses() {
        assert!(server_name("imap.gmail.com").is_ok());
    }

    #[test]
    fn empty_server_name_is_rejected() {
        assert!(matches!(
            server_name(""),
            Err(Error::InvalidDnsName { .. })
        ));
    }

    #[test]
    fn display_masks_proxy_password() {
        let proxy = Socks5Proxy::with_auth("proxy.example.com", 1080, "user", "secret");
        let display = proxy.to_string();
        assert!(display.contains("***"));
        assert!(!display.contains("secret"));
    }
}
