//! Integration tests for the POP3 client.
//!
//! These tests use a mock stream to simulate POP3 server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailledger_pop3::{
    Client, Command, Connection, Error, MaildropStat, MessageSummary, PlainFraming,
};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
    /// Set once the client shuts the stream down.
    shut_down: Arc<AtomicBool>,
}

/// Handles kept by the test after the stream moves into the client.
struct Probe {
    sent: Arc<Mutex<Vec<u8>>>,
    shut_down: Arc<AtomicBool>,
}

impl Probe {
    fn sent(&self) -> String {
        String::from_utf8(self.sent.lock().unwrap().clone()).unwrap()
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Probe) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let shut_down = Arc::new(AtomicBool::new(false));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
            shut_down: Arc::clone(&shut_down),
        };
        (stream, Probe { sent, shut_down })
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = self.responses.position() as usize;

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

const GREETING: &[u8] = b"+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n";

fn script(parts: &[&[u8]]) -> Vec<u8> {
    let mut all = GREETING.to_vec();
    for part in parts {
        all.extend_from_slice(part);
    }
    all
}

#[tokio::test]
async fn test_client_greeting() {
    let (stream, probe) = MockStream::new(GREETING);
    let client = Client::from_stream(stream).await.unwrap();

    assert_eq!(
        client.greeting(),
        "POP3 server ready <1896.697170952@dbc.mtview.ca.us>"
    );
    assert_eq!(probe.sent(), "");
}

#[tokio::test]
async fn test_client_greeting_with_probe() {
    let (stream, probe) = MockStream::new(GREETING);
    Client::from_stream_with_probe(stream).await.unwrap();
    assert_eq!(probe.sent(), "\r\n");
}

#[tokio::test]
async fn test_negative_greeting() {
    let (stream, _probe) = MockStream::new(b"-ERR server busy\r\n");
    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ref text) if text == "server busy"));
}

#[tokio::test]
async fn test_empty_greeting_is_malformed() {
    let (stream, _probe) = MockStream::new(b"\r\n");
    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_capabilities() {
    let responses = script(&[
        b"+OK Capability list follows\r\nTOP\r\nUIDL\r\nSASL CRAM-MD5 PLAIN\r\n.\r\n",
    ]);
    let (stream, probe) = MockStream::new(&responses);
    let mut client = Client::from_stream(stream).await.unwrap();

    let caps = client.capabilities().await.unwrap();
    assert_eq!(caps.lines, vec!["TOP", "UIDL", "SASL CRAM-MD5 PLAIN"]);
    assert_eq!(caps.mechanisms(), ["CRAM-MD5", "PLAIN"]);
    assert!(!caps.supports_plain());
    assert!(caps.supports_top());
    assert_eq!(probe.sent(), "CAPA\r\n");
}

#[tokio::test]
async fn test_capa_rejected_does_not_read_block() {
    let responses = script(&[b"-ERR unknown command\r\n"]);
    let (stream, _probe) = MockStream::new(&responses);
    let mut client = Client::from_stream(stream).await.unwrap();

    let err = client.capabilities().await.unwrap_err();
    assert!(err.is_protocol());
    assert!(!client.is_closed());
}

#[tokio::test]
async fn test_auth_cram_md5() {
    let challenge = "PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+";
    let responses = script(&[
        b"+OK\r\nSASL CRAM-MD5 PLAIN\r\nPLAIN\r\n.\r\n",
        format!("+ {challenge}\r\n").as_bytes(),
        b"+OK maildrop locked and ready\r\n",
    ]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();

    client.auth("tim", "tanstaaftanstaaf").await.unwrap();

    let expected = STANDARD.encode("tim b913a602c7eda7a495b4e6e7334d3890");
    assert_eq!(
        probe.sent(),
        format!("CAPA\r\nAUTH CRAM-MD5\r\n{expected}\r\n")
    );
}

#[tokio::test]
async fn test_auth_cram_md5_rejected() {
    let responses = script(&[
        b"+OK\r\nSASL CRAM-MD5\r\n.\r\n",
        b"+ PDEyMzQ+\r\n",
        b"-ERR authentication failed\r\n",
    ]);
    let (stream, _probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();

    let err = client.auth("tim", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ref text) if text == "authentication failed"));
}

#[tokio::test]
async fn test_auth_plain_rfc4616() {
    let responses = script(&[b"+OK\r\nUIDL\r\nPLAIN\r\n.\r\n", b"+OK logged in\r\n"]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();

    client.auth("user", "pass").await.unwrap();
    assert_eq!(probe.sent(), "CAPA\r\nAUTH PLAIN AHVzZXIAcGFzcw==\r\n");
}

#[tokio::test]
async fn test_auth_plain_password_only() {
    let responses = script(&[b"+OK\r\nPLAIN\r\n.\r\n", b"+OK logged in\r\n"]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .with_plain_framing(PlainFraming::PasswordOnly);

    client.auth("user", "pass").await.unwrap();
    assert_eq!(probe.sent(), "CAPA\r\nAUTH PLAIN cGFzcw==\r\n");
}

#[tokio::test]
async fn test_auth_with_explicit_framing() {
    let responses = script(&[b"+OK\r\nPLAIN\r\n.\r\n", b"+OK logged in\r\n"]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();

    client
        .auth_with("user", "pass", PlainFraming::PasswordOnly)
        .await
        .unwrap();
    assert!(probe.sent().ends_with("AUTH PLAIN cGFzcw==\r\n"));
}

#[tokio::test]
async fn test_auth_unsupported() {
    let responses = script(&[b"+OK\r\n.\r\n"]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();

    let err = client.auth("user", "pass").await.unwrap_err();
    assert!(matches!(err, Error::AuthUnsupported));
    assert_eq!(probe.sent(), "CAPA\r\n");
}

/// Authenticates with PLAIN, then runs `tail` responses.
async fn authorized(tail: &[&[u8]]) -> (Client<MockStream, mailledger_pop3::Authorized>, Probe) {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(tail.len() + 2);
    parts.push(b"+OK\r\nPLAIN\r\n.\r\n");
    parts.push(b"+OK\r\n");
    parts.extend_from_slice(tail);
    let responses = script(&parts);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .auth("user", "pass")
        .await
        .unwrap();
    probe.sent.lock().unwrap().clear();
    (client, probe)
}

#[tokio::test]
async fn test_stat() {
    let (mut client, probe) = authorized(&[b"+OK 5 2048\r\n"]).await;
    let stat = client.stat().await.unwrap();
    assert_eq!(stat, MaildropStat { count: 5, total_size: 2048 });
    assert_eq!(probe.sent(), "STAT\r\n");
}

#[tokio::test]
async fn test_stat_malformed() {
    let (mut client, _probe) = authorized(&[b"+OK abc 10\r\n"]).await;
    let err = client.stat().await.unwrap_err();
    assert!(err.is_malformed());
    assert!(!client.is_closed());
}

#[tokio::test]
async fn test_list_single() {
    let (mut client, probe) = authorized(&[b"+OK 3 512\r\n"]).await;
    let summary = client.list(3).await.unwrap();
    assert_eq!(summary.size, 512);
    assert_eq!(summary.id, 3);
    assert_eq!(probe.sent(), "LIST 3\r\n");
}

#[tokio::test]
async fn test_list_missing_message() {
    let (mut client, _probe) =
        authorized(&[b"-ERR no such message, only 2 messages in maildrop\r\n"]).await;
    let err = client.list(9).await.unwrap_err();
    let expected = "no such message, only 2 messages in maildrop";
    assert!(matches!(err, Error::Protocol(ref text) if text == expected));
}

#[tokio::test]
async fn test_list_all() {
    let (mut client, probe) =
        authorized(&[b"+OK 2 messages (320 octets)\r\n1 120\r\n2 200\r\n.\r\n"]).await;
    let listing = client.list_all().await.unwrap();
    assert_eq!(
        listing,
        vec![
            MessageSummary { id: 1, size: 120 },
            MessageSummary { id: 2, size: 200 },
        ]
    );
    let (ids, sizes) = MessageSummary::unzip(&listing);
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(sizes, vec![120, 200]);
    assert_eq!(probe.sent(), "LIST\r\n");
}

#[tokio::test]
async fn test_list_all_parse_failure_returns_nothing() {
    let (mut client, _probe) =
        authorized(&[b"+OK\r\n1 120\r\n2 huge\r\n.\r\n+OK 1 120\r\n"]).await;
    let err = client.list_all().await.unwrap_err();
    assert!(err.is_malformed());

    // The block was fully consumed, so the session stays in sync.
    let summary = client.list(1).await.unwrap();
    assert_eq!(summary.size, 120);
}

#[tokio::test]
async fn test_retr_unstuffs_and_joins() {
    let (mut client, probe) = authorized(&[
        b"+OK 120 octets\r\nSubject: hi\r\n\r\n..dotted\r\nbody\r\n.\r\n",
    ])
    .await;
    let text = client.retr(1).await.unwrap();
    assert_eq!(text, "Subject: hi\n\n.dotted\nbody");
    assert_eq!(probe.sent(), "RETR 1\r\n");
}

#[tokio::test]
async fn test_retr_overlong_line_closes_session() {
    let mut reply = b"+OK 2097152 octets\r\n".to_vec();
    reply.extend(std::iter::repeat_n(b'A', 2 * 1024 * 1024));
    reply.extend_from_slice(b"\r\n.\r\n+OK\r\n");
    let (mut client, probe) = authorized(&[reply.as_slice()]).await;

    let err = client.retr(1).await.unwrap_err();
    assert!(err.is_malformed());
    assert!(client.is_closed());

    // The NOOP reply queued behind the long line is never misread.
    let err = client.noop().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(probe.sent(), "RETR 1\r\n");
}

#[tokio::test]
async fn test_top_and_uidl() {
    let (mut client, probe) = authorized(&[
        b"+OK\r\nSubject: hi\r\n.\r\n",
        b"+OK 2 QhdPYR:00WBw1Ph7x7\r\n",
        b"+OK\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n2 QhdPYR:00WBw1Ph7x7\r\n.\r\n",
    ])
    .await;

    assert_eq!(client.top(1, 0).await.unwrap(), "Subject: hi");
    let uid = client.uidl(2).await.unwrap();
    assert_eq!(uid.uid, "QhdPYR:00WBw1Ph7x7");
    let all = client.uidl_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, 1);
    assert_eq!(probe.sent(), "TOP 1 0\r\nUIDL 2\r\nUIDL\r\n");
}

#[tokio::test]
async fn test_dele_noop_rset() {
    let (mut client, probe) =
        authorized(&[b"+OK message 1 deleted\r\n", b"+OK\r\n", b"+OK\r\n"]).await;
    client.dele(1).await.unwrap();
    client.noop().await.unwrap();
    client.rset().await.unwrap();
    assert_eq!(probe.sent(), "DELE 1\r\nNOOP\r\nRSET\r\n");
}

#[tokio::test]
async fn test_quit_closes_transport() {
    let (client, probe) = authorized(&[b"+OK dewey POP3 server signing off\r\n"]).await;
    let mut conn = client.into_connection();

    conn.quit().await.unwrap();
    assert!(probe.is_shut_down());

    let err = conn.command(&Command::Noop).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(probe.sent(), "QUIT\r\n");
}

#[tokio::test]
async fn test_client_quit() {
    let (client, probe) = authorized(&[b"+OK bye\r\n"]).await;
    client.quit().await.unwrap();
    assert!(probe.is_shut_down());
}

#[tokio::test]
async fn test_send_raw_user_pass() {
    let responses = script(&[
        b"+OK mrose is a real hoopy frood\r\n",
        b"+OK mrose's maildrop has 2 messages (320 octets)\r\n",
        b"+OK\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n.\r\n",
    ]);
    let (stream, probe) = MockStream::new(&responses);
    let mut client = Client::from_stream(stream).await.unwrap();

    client.send_raw("USER mrose").await.unwrap();
    let status = client.send_raw("PASS secret").await.unwrap();
    assert_eq!(status.text, "mrose's maildrop has 2 messages (320 octets)");
    let (_, lines) = client.send_raw_multiline("UIDL").await.unwrap();
    assert_eq!(lines, vec!["1 whqtswO00WBw418f9t5JxYwZ"]);

    let err = client.send_raw("NOOP\r\nDELE 1").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCommand(_)));
    assert_eq!(probe.sent(), "USER mrose\r\nPASS secret\r\nUIDL\r\n");
}

#[tokio::test]
async fn test_quit_before_auth() {
    let responses = script(&[b"+OK bye\r\n"]);
    let (stream, probe) = MockStream::new(&responses);
    let client = Client::from_stream(stream).await.unwrap();
    client.quit().await.unwrap();
    assert!(probe.is_shut_down());
}

#[tokio::test]
async fn test_eof_closes_session() {
    let (mut client, probe) = authorized(&[]).await;

    let err = client.noop().await.unwrap_err();
    assert!(err.is_transport());
    assert!(client.is_closed());

    let err = client.stat().await.unwrap_err();
    assert!(err.is_transport());
    // Only the first NOOP reached the wire.
    assert_eq!(probe.sent(), "NOOP\r\n");
}

proptest! {
    #[test]
    fn prop_block_without_leading_dots_round_trips(
        lines in proptest::collection::vec("[a-zA-Z0-9 :]{0,40}", 0..20)
    ) {
        let mut wire = Vec::new();
        for line in &lines {
            wire.extend_from_slice(line.as_bytes());
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b".\r\n");

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let read = runtime.block_on(async {
            let (stream, _probe) = MockStream::new(&wire);
            let mut conn = Connection::new(stream);
            conn.read_lines().await
        }).unwrap();

        prop_assert_eq!(read, lines);
    }
}
