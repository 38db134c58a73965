#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: List and optionally download every message in a maildrop
//!
//! ## Environment
//!
//! - `POP3_HOST` - server hostname (required)
//! - `POP3_USER` / `POP3_PASSWORD` - credentials (required)
//! - `POP3_PORT` - override the default port
//! - `POP3_PLAINTEXT` - set to connect without TLS (port 110)
//! - `POP3_RETR` - set to print each message body
//! - `RUST_LOG` - tracing filter, e.g. `mailledger_pop3=debug`
//!
//! ## Running
//!
//! ```bash
//! POP3_HOST=pop.example.com POP3_USER=me POP3_PASSWORD=secret \
//!     cargo run --package mailledger-pop3 --example fetch_all
//! ```

use std::env;

use anyhow::Context;
use mailledger_pop3::{Client, Config, Security};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = env::var("POP3_HOST").context("POP3_HOST is not set")?;
    let user = env::var("POP3_USER").context("POP3_USER is not set")?;
    let password = env::var("POP3_PASSWORD").context("POP3_PASSWORD is not set")?;

    let security = if env::var_os("POP3_PLAINTEXT").is_some() {
        Security::None
    } else {
        Security::Implicit
    };
    let mut builder = Config::builder(host).security(security);
    if let Ok(port) = env::var("POP3_PORT") {
        builder = builder.port(port.parse().context("POP3_PORT must be a port number")?);
    }
    let config = builder.build();

    println!("Connecting to {}:{}...", config.host, config.port);
    let client = Client::connect(&config).await?;
    println!("✓ Connected: {}", client.greeting());

    let mut client = client
        .auth(&user, &password)
        .await
        .context("authentication failed")?;
    println!("✓ Authenticated as {}\n", user);

    let stat = client.stat().await?;
    println!("{} messages, {} octets total", stat.count, stat.total_size);

    let print_bodies = env::var_os("POP3_RETR").is_some();
    for msg in client.list_all().await? {
        println!("  #{:<5} {:>10} octets", msg.id, msg.size);
        if print_bodies {
            let text = client.retr(msg.id).await?;
            println!("{}\n", text);
        }
    }

    println!("\nDisconnecting...");
    client.quit().await?;
    println!("✓ Disconnected");

    Ok(())
}
