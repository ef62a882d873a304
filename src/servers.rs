//! IMAP host discovery from email domains.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// IMAP hostnames for common providers whose host is not `imap.{domain}`.
static PROVIDER_HOSTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("gmail.com", "imap.gmail.com"),
        ("yahoo.com", "imap.mail.yahoo.com"),
        ("hotmail.com", "imap-mail.outlook.com"),
        ("outlook.com", "imap-mail.outlook.com"),
        ("live.com", "imap-mail.outlook.com"),
        ("aol.com", "imap.aol.com"),
        ("icloud.com", "imap.mail.me.com"),
        ("me.com", "imap.mail.me.com"),
        ("mac.com", "imap.mail.me.com"),
        ("yandex.ru", "imap.yandex.ru"),
        ("yandex.com", "imap.yandex.ru"),
        ("mail.ru", "imap.mail.ru"),
        ("gmx.de", "imap.gmx.net"),
        ("gmx.net", "imap.gmx.net"),
        ("gmx.com", "imap.gmx.net"),
        ("web.de", "imap.web.de"),
        ("t-online.de", "secureimap.t-online.de"),
    ])
});

/// Returns the IMAP hostname for an email address.
///
/// Known providers resolve from the built-in table; anything else falls back
/// to `imap.{domain}`. Domain lookup is case-insensitive.
pub(crate) fn imap_host_for(email: &str) -> String {
    let domain = email
        .split_once('@')
        .map_or(email, |(_, domain)| domain)
        .to_lowercase();

    PROVIDER_HOSTS
        .get(domain.as_str())
        .map_or_else(|| format!("imap.{domain}"), |&host| host.to_owned())
}
