//! Demo: watching a mailbox through a SOCKS5 proxy.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! export PROXY_HOST="proxy.example.com"
//! export PROXY_PORT="1080"
//! # Optional authentication
//! export PROXY_USER="username"
//! export PROXY_PASS="password"
//! cargo run --example with_proxy
//! ```

use email_watch::{InboxWatcher, Socks5Proxy, WatchConfig};
use std::env;

#[tokio::main]
async fn main() -> email_watch::Result<()> {
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");
    let proxy_host = env::var("PROXY_HOST").expect("PROXY_HOST environment variable required");
    let proxy_port: u16 = env::var("PROXY_PORT")
        .expect("PROXY_PORT environment variable required")
        .parse()
        .expect("PROXY_PORT must be a port number");

    let proxy = match (env::var("PROXY_USER").ok(), env::var("PROXY_PASS").ok()) {
        (Some(user), Some(pass)) => Socks5Proxy::with_auth(&proxy_host, proxy_port, user, pass),
        _ => Socks5Proxy::new(&proxy_host, proxy_port),
    };

    println!("Connecting to IMAP for {email} via {proxy}...");

    let config = WatchConfig::builder()
        .email(&email)
        .password(password)
        .proxy(proxy)
        .build()?;

    let mut watcher = InboxWatcher::connect(config).await?;

    println!("Connected through proxy. Waiting for a new message...");

    match watcher.wait_for_new_message().await? {
        Some(message) => println!("Delivered: {} / {}", message.from, message.subject),
        None => println!("Nothing arrived within the wait budget."),
    }

    watcher.logout().await?;

    Ok(())
}
