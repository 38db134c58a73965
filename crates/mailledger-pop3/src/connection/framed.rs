//! Framed I/O for the POP3 protocol.
//!
//! POP3 is half-duplex: one command goes out, one status line comes back,
//! optionally followed by a dot-terminated block. [`Connection`] owns the
//! buffered stream and enforces that ordering through `&mut self`.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_terminator, parse_status_line, unstuff_line};
use crate::types::StatusLine;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Protocol engine over a single transport.
///
/// Once a transport error occurs, a line exceeds the length limit, or after
/// [`Connection::quit`] or [`Connection::close`], the connection is closed
/// and every further call fails with [`Error::Transport`] without touching
/// the stream.
pub struct Connection<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    closed: bool,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection over an established stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            closed: false,
        }
    }

    /// Returns true once the session can no longer issue commands.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads the server greeting.
    ///
    /// With `probe` set, a bare CRLF is written first for servers that wait
    /// for client input before greeting.
    pub async fn read_greeting(&mut self, probe: bool) -> Result<StatusLine> {
        self.ensure_open()?;
        let result = async {
            if probe {
                self.write_command(&Command::Probe).await?;
            }
            self.read_status().await
        }
        .await;
        self.track(result)
    }

    /// Sends one command and reads its status line.
    ///
    /// A `-ERR` reply is returned as [`Error::Protocol`]. If the command
    /// promises a multi-line reply, the caller must follow up with
    /// [`Connection::read_lines`]. A [`Command::Raw`] line containing a line
    /// break fails with [`Error::InvalidCommand`] before anything is written.
    pub async fn command(&mut self, cmd: &Command) -> Result<StatusLine> {
        self.ensure_open()?;
        let result = async {
            self.write_command(cmd).await?;
            self.read_status().await
        }
        .await;
        self.track(result)
    }

    /// Reads a dot-terminated block.
    ///
    /// Lines are returned without terminators and with one leading dot
    /// removed. Calling this after a single-line reply waits until the
    /// server happens to send a lone `.`, which may be never.
    pub async fn read_lines(&mut self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let result = async {
            let mut lines = Vec::new();
            loop {
                let line = self.read_line().await?;
                if is_terminator(&line) {
                    break;
                }
                lines.push(unstuff_line(&line).to_string());
            }
            Ok::<_, Error>(lines)
        }
        .await;
        self.track(result)
    }

    /// Sends a command with a multi-line reply and reads the whole block.
    ///
    /// The block is only read if the status line is positive.
    pub async fn command_multiline(&mut self, cmd: &Command) -> Result<(StatusLine, Vec<String>)> {
        debug_assert!(
            cmd.is_multiline() || matches!(cmd, Command::Raw(_)),
            "{cmd} has a single-line reply"
        );
        let status = self.command(cmd).await?;
        let lines = self.read_lines().await?;
        Ok((status, lines))
    }

    /// Sends QUIT and, if the server accepts it, closes the transport.
    pub async fn quit(&mut self) -> Result<()> {
        self.command(&Command::Quit).await?;
        self.close().await
    }

    /// Shuts the transport down. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::info!("closing POP3 session");
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the connection and returns the inner stream.
    ///
    /// Note: Any buffered data will be lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::closed())
        } else {
            Ok(())
        }
    }

    /// Marks the session closed on transport failure.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(Error::Transport(e)) = &result
            && !self.closed
        {
            tracing::warn!(error = %e, "transport failure, session closed");
            self.closed = true;
        }
        result
    }

    async fn write_command(&mut self, cmd: &Command) -> Result<()> {
        cmd.validate()?;
        tracing::debug!(%cmd, "sending command");

        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(&cmd.serialize());

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn read_status(&mut self) -> Result<StatusLine> {
        let line = self.read_line().await?;
        parse_status_line(&line)?.into_result()
    }

    /// Reads one LF-terminated line and strips the CRLF/LF terminator.
    async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            // The rest of the line is still unread, so the session can no
            // longer pair replies with commands.
            if line.len() > MAX_LINE_LENGTH {
                tracing::warn!(len = line.len(), "line exceeds limit, session closed");
                self.closed = true;
                return Err(Error::malformed("line too long"));
            }
        }

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        let line = String::from_utf8_lossy(&line).into_owned();
        tracing::trace!(line = %line, "received line");
        Ok(line)
    }
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
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_command_ok() {
        let mock = Builder::new()
            .write(b"STAT\r\n")
            .read(b"+OK 2 320\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let status = conn.command(&Command::Stat).await.unwrap();
        assert!(status.ok);
        assert_eq!(status.text, "2 320");
    }

    #[tokio::test]
    async fn test_command_err_is_protocol_error() {
        let mock = Builder::new()
            .write(b"DELE 9\r\n")
            .read(b"-ERR no such message\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let err = conn.command(&Command::Dele(9)).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ref text) if text == "no such message"));
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn test_empty_status_line_is_malformed() {
        let mock = Builder::new().write(b"NOOP\r\n").read(b"\r\n").build();
        let mut conn = Connection::new(mock);

        let err = conn.command(&Command::Noop).await.unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn test_read_lines_unstuffs_and_stops_at_terminator() {
        let mock = Builder::new()
            .read(b"first\r\n.hello\r\n..\r\n\r\n.\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let lines = conn.read_lines().await.unwrap();
        assert_eq!(lines, vec!["first", "hello", ".", ""]);
    }

    #[tokio::test]
    async fn test_read_lines_across_chunks() {
        let mock = Builder::new()
            .read(b"par")
            .read(b"tial line\r")
            .read(b"\n.\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let lines = conn.read_lines().await.unwrap();
        assert_eq!(lines, vec!["partial line"]);
    }

    #[tokio::test]
    async fn test_bare_lf_accepted() {
        let mock = Builder::new().read(b"+OK ready\n").build();
        let mut conn = Connection::new(mock);

        let status = conn.read_greeting(false).await.unwrap();
        assert_eq!(status.text, "ready");
    }

    #[tokio::test]
    async fn test_greeting_probe_writes_bare_crlf() {
        let mock = Builder::new()
            .write(b"\r\n")
            .read(b"+OK POP3 server ready\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let status = conn.read_greeting(true).await.unwrap();
        assert_eq!(status.text, "POP3 server ready");
    }

    #[tokio::test]
    async fn test_eof_closes_session() {
        let mock = Builder::new().write(b"NOOP\r\n").build();
        let mut conn = Connection::new(mock);

        let err = conn.command(&Command::Noop).await.unwrap_err();
        assert!(err.is_transport());
        assert!(conn.is_closed());

        let err = conn.command(&Command::Noop).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_raw_command_multiline() {
        let mock = Builder::new()
            .write(b"USER mrose\r\n")
            .read(b"+OK mrose is a real hoopy frood\r\n")
            .write(b"XTND XLST\r\n")
            .read(b"+OK\r\n1 a\r\n.\r\n")
            .build();
        let mut conn = Connection::new(mock);

        let status = conn.command(&Command::raw("USER mrose").unwrap()).await.unwrap();
        assert_eq!(status.text, "mrose is a real hoopy frood");

        let cmd = Command::raw("XTND XLST").unwrap();
        let (_, lines) = conn.command_multiline(&cmd).await.unwrap();
        assert_eq!(lines, vec!["1 a"]);
    }

    #[tokio::test]
    async fn test_raw_command_with_line_break_is_not_sent() {
        let mock = Builder::new().write(b"NOOP\r\n").read(b"+OK\r\n").build();
        let mut conn = Connection::new(mock);

        let smuggled = Command::Raw("USER a\r\nDELE 1".to_string());
        let err = conn.command(&smuggled).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
        assert!(!conn.is_closed());

        conn.command(&Command::Noop).await.unwrap();
    }

    #[tokio::test]
    async fn test_overlong_line_closes_session() {
        let long_line = vec![b'A'; MAX_LINE_LENGTH + 1];
        let mock = Builder::new().write(b"NOOP\r\n").read(&long_line).build();
        let mut conn = Connection::new(mock);

        let err = conn.command(&Command::Noop).await.unwrap_err();
        assert!(err.is_malformed());
        assert!(conn.is_closed());

        // Nothing more is written or read once the stream is out of step.
        let err = conn.command(&Command::Noop).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_quit_then_command_fails() {
        let mock = Builder::new()
            .write(b"QUIT\r\n")
            .read(b"+OK bye\r\n")
            .build();
        let mut conn = Connection::new(mock);

        conn.quit().await.unwrap();
        assert!(conn.is_closed());

        let err = conn.command(&Command::Stat).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_rejected_quit_keeps_session_open() {
        let mock = Builder::new()
            .write(b"QUIT\r\n")
            .read(b"-ERR some deleted messages not removed\r\n")
            .build();
        let mut conn = Connection::new(mock);

        assert!(conn.quit().await.unwrap_err().is_protocol());
        assert!(!conn.is_closed());
    }
}
