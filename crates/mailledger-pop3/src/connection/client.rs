//! Type-state POP3 client.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Config, Connection, Pop3Stream, connect};
use crate::auth::{AuthMechanism, PlainFraming, cram_md5_response, plain_response};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{parse_scan_listing, parse_stat, parse_unique_id};
use crate::types::{Capabilities, MaildropStat, MessageSummary, StatusLine, UniqueId};

/// Type-state marker for the AUTHORIZATION state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unauthenticated;

/// Type-state marker for the TRANSACTION state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authorized;

/// POP3 client with type-state pattern.
///
/// The closed state has no marker: [`Client::quit`] consumes the client, and
/// a transport failure leaves a client whose every call fails with
/// [`Error::Transport`].
pub struct Client<S, State> {
    conn: Connection<S>,
    greeting: String,
    plain_framing: PlainFraming,
    _state: PhantomData<State>,
}

// Manual Debug implementation so the stream type need not implement Debug
impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("conn", &self.conn)
            .field("greeting", &self.greeting)
            .field("plain_framing", &self.plain_framing)
            .finish_non_exhaustive()
    }
}

impl Client<Pop3Stream, Unauthenticated> {
    /// Dials the server described by `config` and reads the greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or reading the greeting fails.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connect(config).await?;
        let client = Self::handshake(stream, config.handshake_probe).await?;
        Ok(client.with_plain_framing(config.plain_framing))
    }
}

impl<S> Client<S, Unauthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::handshake(stream, false).await
    }

    /// Like [`Client::from_stream`], but sends a bare CRLF first to prompt
    /// servers that wait for input before greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe, the greeting read, or the greeting itself fails.
    pub async fn from_stream_with_probe(stream: S) -> Result<Self> {
        Self::handshake(stream, true).await
    }

    async fn handshake(stream: S, probe: bool) -> Result<Self> {
        let mut conn = Connection::new(stream);
        let greeting = conn.read_greeting(probe).await?;
        tracing::debug!(greeting = %greeting.text, "server greeting");

        Ok(Self {
            conn,
            greeting: greeting.text,
            plain_framing: PlainFraming::default(),
            _state: PhantomData,
        })
    }

    /// Sets the credential layout used when PLAIN is selected.
    #[must_use]
    pub const fn with_plain_framing(mut self, framing: PlainFraming) -> Self {
        self.plain_framing = framing;
        self
    }

    /// Authenticates with the best mechanism the server advertises.
    ///
    /// Issues CAPA, then uses CRAM-MD5 if listed, else PLAIN if the bare
    /// `PLAIN` capability is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthUnsupported`] if no usable mechanism is
    /// advertised, or the server's error if authentication fails.
    pub async fn auth(self, username: &str, password: &str) -> Result<Client<S, Authorized>> {
        let framing = self.plain_framing;
        self.auth_with(username, password, framing).await
    }

    /// Authenticates like [`Client::auth`] with an explicit PLAIN framing.
    ///
    /// # Errors
    ///
    /// Same as [`Client::auth`].
    pub async fn auth_with(
        mut self,
        username: &str,
        password: &str,
        framing: PlainFraming,
    ) -> Result<Client<S, Authorized>> {
        let caps = self.capabilities().await?;
        let mechanism = AuthMechanism::select(&caps).ok_or(Error::AuthUnsupported)?;
        tracing::info!(mechanism = mechanism.as_str(), username, "authenticating");

        match mechanism {
            AuthMechanism::CramMd5 => {
                let challenge = self
                    .conn
                    .command(&Command::Auth {
                        mechanism,
                        initial_response: None,
                    })
                    .await?;
                let response = cram_md5_response(username, password, &challenge.text)?;
                self.conn.command(&Command::SaslResponse(response)).await?;
            }
            AuthMechanism::Plain => {
                let cmd = Command::Auth {
                    mechanism,
                    initial_response: Some(plain_response(username, password, framing)),
                };
                self.conn.command(&cmd).await?;
            }
        }

        Ok(Client {
            conn: self.conn,
            greeting: self.greeting,
            plain_framing: self.plain_framing,
            _state: PhantomData,
        })
    }
}

impl<S> Client<S, Authorized>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the message count and total maildrop size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the reply is not two numbers.
    pub async fn stat(&mut self) -> Result<MaildropStat> {
        let status = self.conn.command(&Command::Stat).await?;
        parse_stat(&status.text)
    }

    /// Returns the scan listing for one message.
    ///
    /// # Errors
    ///
    /// Returns the server's error if the message does not exist, or
    /// [`Error::MalformedResponse`] if the listing cannot be parsed.
    pub async fn list(&mut self, id: u32) -> Result<MessageSummary> {
        let status = self.conn.command(&Command::List(Some(id))).await?;
        parse_scan_listing(&status.text)
    }

    /// Returns the scan listing for every message, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if any line cannot be parsed; no
    /// partial listing is returned.
    pub async fn list_all(&mut self) -> Result<Vec<MessageSummary>> {
        let (_, lines) = self.conn.command_multiline(&Command::List(None)).await?;
        lines.iter().map(|line| parse_scan_listing(line)).collect()
    }

    /// Retrieves a message, lines joined with `\n`.
    ///
    /// # Errors
    ///
    /// Returns the server's error if the message does not exist.
    pub async fn retr(&mut self, id: u32) -> Result<String> {
        let (_, lines) = self.conn.command_multiline(&Command::Retr(id)).await?;
        Ok(lines.join("\n"))
    }

    /// Retrieves the headers and the first `lines` body lines of a message.
    ///
    /// # Errors
    ///
    /// Returns the server's error if TOP is unsupported or the message does not exist.
    pub async fn top(&mut self, id: u32, lines: u32) -> Result<String> {
        let (_, block) = self
            .conn
            .command_multiline(&Command::Top { id, lines })
            .await?;
        Ok(block.join("\n"))
    }

    /// Returns the unique id of one message.
    ///
    /// # Errors
    ///
    /// Returns the server's error if UIDL is unsupported or the message does not exist.
    pub async fn uidl(&mut self, id: u32) -> Result<UniqueId> {
        let status = self.conn.command(&Command::Uidl(Some(id))).await?;
        parse_unique_id(&status.text)
    }

    /// Returns the unique ids of every message, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if any line cannot be parsed.
    pub async fn uidl_all(&mut self) -> Result<Vec<UniqueId>> {
        let (_, lines) = self.conn.command_multiline(&Command::Uidl(None)).await?;
        lines.iter().map(|line| parse_unique_id(line)).collect()
    }

    /// Marks a message as deleted.
    ///
    /// # Errors
    ///
    /// Returns the server's error if the message does not exist.
    pub async fn dele(&mut self, id: u32) -> Result<()> {
        self.conn.command(&Command::Dele(id)).await?;
        Ok(())
    }

    /// Does nothing; keeps the session alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn noop(&mut self) -> Result<()> {
        self.conn.command(&Command::Noop).await?;
        Ok(())
    }

    /// Unmarks every message marked as deleted in this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn rset(&mut self) -> Result<()> {
        self.conn.command(&Command::Rset).await?;
        Ok(())
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the text of the server greeting.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Returns true once a transport failure has closed the session.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    /// Issues CAPA and parses the result.
    ///
    /// # Errors
    ///
    /// Returns the server's error if CAPA is not supported.
    pub async fn capabilities(&mut self) -> Result<Capabilities> {
        let (_, lines) = self.conn.command_multiline(&Command::Capa).await?;
        Ok(Capabilities::parse(lines))
    }

    /// Sends a command line the client has no method for and reads its
    /// status line.
    ///
    /// The session state is not tracked: sending `USER`/`PASS` here does not
    /// turn the client into `Client<S, Authorized>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] if `line` contains a line break, or
    /// the server's error if it rejects the command.
    pub async fn send_raw(&mut self, line: &str) -> Result<StatusLine> {
        let cmd = Command::raw(line)?;
        self.conn.command(&cmd).await
    }

    /// Like [`Client::send_raw`] for a command answered with a
    /// dot-terminated block.
    ///
    /// # Errors
    ///
    /// Same as [`Client::send_raw`].
    pub async fn send_raw_multiline(&mut self, line: &str) -> Result<(StatusLine, Vec<String>)> {
        let cmd = Command::raw(line)?;
        self.conn.command_multiline(&cmd).await
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.conn.quit().await
    }

    /// Consumes the client and returns the protocol connection.
    pub fn into_connection(self) -> Connection<S> {
        self.conn
    }
}
