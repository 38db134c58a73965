//! # mailledger-pop3
//!
//! A POP3 client library implementing RFC 1939, with CAPA (RFC 2449) and
//! SASL AUTH (RFC 5034).
//!
//! ## Features
//!
//! - **Type-state session management**: AUTHORIZATION and TRANSACTION
//!   commands are only callable in their state
//! - **Protocol support**: STAT, LIST, RETR, DELE, NOOP, RSET, QUIT, plus
//!   UIDL and TOP
//! - **Authentication**: CRAM-MD5 and PLAIN, picked from CAPA
//! - **TLS via rustls**: Implicit TLS on port 995
//! - **Transport-agnostic core**: works over any `AsyncRead + AsyncWrite` stream
//! - **Extensible**: `Client::send_raw` issues commands without a dedicated method
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailledger_pop3::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> mailledger_pop3::Result<()> {
//!     let config = Config::new("pop.example.com");
//!     let client = Client::connect(&config).await?;
//!
//!     // Negotiates CRAM-MD5 or PLAIN from CAPA
//!     let mut client = client.auth("user@example.com", "password").await?;
//!
//!     let stat = client.stat().await?;
//!     println!("{} messages, {} octets", stat.count, stat.total_size);
//!
//!     for msg in client.list_all().await? {
//!         let text = client.retr(msg.id).await?;
//!         println!("--- message {} ({} octets)\n{text}", msg.id, msg.size);
//!     }
//!
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌──────────────────┐
//! │  Unauthenticated │ ─── auth() ───→ Authorized ─── quit() ───→ closed
//! └──────────────────┘
//! ```
//!
//! A transport error closes the session from any state; later calls fail
//! with [`Error::Transport`].
//!
//! ## Known limitation
//!
//! Block lines starting with `.` always lose exactly one dot. Conforming
//! servers double every leading dot, so nothing is lost against them; a
//! server that sends an unescaped leading dot will see it stripped.
//!
//! ## Modules
//!
//! - [`auth`]: SASL mechanism selection and responses
//! - [`command`]: POP3 command builder
//! - [`connection`]: Protocol engine, type-state client, dial helpers
//! - [`parser`]: Status line and listing parser
//! - [`types`]: Core POP3 types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use auth::{AuthMechanism, PlainFraming};
pub use command::Command;
pub use connection::{
    Authorized, Client, Config, ConfigBuilder, Connection, Pop3Stream, Security, Unauthenticated,
};
pub use error::{Error, Result};
pub use types::{Capabilities, MaildropStat, MessageSummary, StatusLine, UniqueId};

/// POP3 protocol version supported.
pub const POP3_VERSION: &str = "POP3 (RFC 1939)";
