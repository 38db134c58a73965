//! POP3 connection management with type-state pattern.
//!
//! [`Connection`] is the protocol engine: one command, one status line,
//! optional dot-terminated block. [`Client`] layers the session states on
//! top of it. [`connect`] and friends are thin dial helpers; any
//! `AsyncRead + AsyncWrite + Unpin` stream works with the client.

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authorized, Client, Unauthenticated};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::Connection;
pub use stream::{Pop3Stream, connect, connect_plain, connect_tls, create_tls_connector};
