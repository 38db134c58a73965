//! Stream types for POP3 connections.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::{Config, Security};
use crate::{Error, Result};

/// A stream that can be either plaintext or TLS.
pub enum Pop3Stream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

/// Byte transport under either variant.
trait Transport: AsyncRead + AsyncWrite + Unpin {}

impl<T: AsyncRead + AsyncWrite + Unpin> Transport for T {}

impl Pop3Stream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    fn transport(self: Pin<&mut Self>) -> Pin<&mut dyn Transport> {
        match self.get_mut() {
            Self::Plain(tcp) => Pin::new(tcp),
            Self::Tls(tls) => Pin::new(tls.as_mut()),
        }
    }
}

impl std::fmt::Debug for Pop3Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = if self.is_tls() { "tls" } else { "plain" };
        f.debug_struct("Pop3Stream")
            .field("transport", &transport)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for Pop3Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.transport().poll_read(cx, buf)
    }
}

impl AsyncWrite for Pop3Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.transport().poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.transport().poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.transport().poll_shutdown(cx)
    }
}

/// Creates a TLS connector with the webpki root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with TLS from the start (port 995).
pub async fn connect_tls(host: &str, port: u16) -> Result<Pop3Stream> {
    let addr = format!("{host}:{port}");
    let tcp = TcpStream::connect(&addr).await?;

    let server_name = ServerName::try_from(host.to_string())?;
    let tls = create_tls_connector().connect(server_name, tcp).await?;

    Ok(Pop3Stream::Tls(Box::new(tls)))
}

/// Connects to a server without TLS (port 110, or testing).
pub async fn connect_plain(host: &str, port: u16) -> Result<Pop3Stream> {
    let addr = format!("{host}:{port}");
    let tcp = TcpStream::connect(&addr).await?;
    Ok(Pop3Stream::Plain(tcp))
}

/// Connects according to `config`, bounded by its connect timeout.
pub async fn connect(config: &Config) -> Result<Pop3Stream> {
    tracing::debug!(
        host = %config.host,
        port = config.port,
        security = ?config.security,
        "connecting"
    );

    let dial = async {
        match config.security {
            Security::None => connect_plain(&config.host, config.port).await,
            Security::Implicit => connect_tls(&config.host, config.port).await,
        }
    };

    tokio::time::timeout(config.connect_timeout, dial)
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_plain_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"+OK ready\r\n").await.unwrap();
        });

        let config = Config::builder("127.0.0.1")
            .security(Security::None)
            .port(port)
            .build();
        let mut stream = connect(&config).await.unwrap();
        assert!(!stream.is_tls());
        assert!(format!("{stream:?}").contains("plain"));

        let mut buf = [0u8; 11];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"+OK ready\r\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect_plain("127.0.0.1", port).await.unwrap_err();
        assert!(err.is_transport());
    }
}
