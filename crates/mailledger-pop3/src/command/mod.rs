//! POP3 command builder.

use std::fmt;

use crate::auth::AuthMechanism;
use crate::error::{Error, Result};

/// POP3 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bare CRLF sent to elicit a greeting from servers that wait for input.
    Probe,
    /// CAPA - List server capabilities
    Capa,
    /// AUTH - Begin SASL authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response, already base64 encoded
        initial_response: Option<String>,
    },
    /// Bare client line answering a SASL challenge
    SaslResponse(String),
    /// STAT - Maildrop message count and size
    Stat,
    /// LIST - Scan listing for one message, or all of them
    List(Option<u32>),
    /// RETR - Retrieve a message
    Retr(u32),
    /// DELE - Mark a message as deleted
    Dele(u32),
    /// NOOP - No operation
    Noop,
    /// RSET - Unmark deleted messages
    Rset,
    /// UIDL - Unique-id listing for one message, or all of them
    Uidl(Option<u32>),
    /// TOP - Headers plus the first `lines` body lines of a message
    Top {
        /// Message number
        id: u32,
        /// Number of body lines
        lines: u32,
    },
    /// QUIT - End the session
    Quit,
    /// Any other command line, sent verbatim (USER, PASS, APOP, STLS, ...)
    ///
    /// Build it with [`Command::raw`] so line breaks are rejected up front.
    Raw(String),
}

impl Command {
    /// Creates a command from caller-supplied text, without the CRLF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] if the text is empty or contains a
    /// CR or LF.
    pub fn raw(text: impl Into<String>) -> Result<Self> {
        let cmd = Self::Raw(text.into());
        cmd.validate()?;
        Ok(cmd)
    }

    /// Checks that the command serializes to exactly one line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] for an empty raw command or for
    /// caller-supplied text containing a line break.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Raw(text) if text.is_empty() => {
                Err(Error::InvalidCommand("empty command line".to_string()))
            }
            Self::Raw(text) | Self::SaslResponse(text) if text.contains(['\r', '\n']) => {
                Err(Error::InvalidCommand("command text contains a line break".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Serializes the command to bytes, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Probe => {}
            Self::Capa => buf.extend_from_slice(b"CAPA"),
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_str().as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }
            Self::SaslResponse(line) => buf.extend_from_slice(line.as_bytes()),
            Self::Stat => buf.extend_from_slice(b"STAT"),
            Self::List(id) => {
                buf.extend_from_slice(b"LIST");
                if let Some(id) = id {
                    buf.extend_from_slice(format!(" {id}").as_bytes());
                }
            }
            Self::Retr(id) => buf.extend_from_slice(format!("RETR {id}").as_bytes()),
            Self::Dele(id) => buf.extend_from_slice(format!("DELE {id}").as_bytes()),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Rset => buf.extend_from_slice(b"RSET"),
            Self::Uidl(id) => {
                buf.extend_from_slice(b"UIDL");
                if let Some(id) = id {
                    buf.extend_from_slice(format!(" {id}").as_bytes());
                }
            }
            Self::Top { id, lines } => {
                buf.extend_from_slice(format!("TOP {id} {lines}").as_bytes());
            }
            Self::Quit => buf.extend_from_slice(b"QUIT"),
            Self::Raw(text) => buf.extend_from_slice(text.as_bytes()),
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns true if a successful reply is followed by a dot-terminated block.
    ///
    /// Always false for [`Command::Raw`]; the caller knows its reply shape.
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        matches!(
            self,
            Self::Capa | Self::List(None) | Self::Uidl(None) | Self::Retr(_) | Self::Top { .. }
        )
    }
}

/// Log-safe rendering: SASL credentials and raw arguments are never printed.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => f.write_str("<probe>"),
            Self::Auth {
                mechanism,
                initial_response: Some(_),
            } => write!(f, "AUTH {} ***", mechanism.as_str()),
            Self::SaslResponse(_) => f.write_str("***"),
            Self::Raw(text) => match text.split_once(' ') {
                Some((verb, _)) => write!(f, "{verb} ***"),
                None => f.write_str(text),
            },
            other => {
                let bytes = other.serialize();
                f.write_str(String::from_utf8_lossy(&bytes).trim_end())
            }
        }
    }
}
