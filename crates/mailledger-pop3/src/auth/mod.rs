//! SASL mechanism selection and responses.
//!
//! Implements:
//! - CRAM-MD5 (RFC 2195) - HMAC-MD5 challenge/response
//! - PLAIN (RFC 4616) - credentials in the initial response
//!
//! Selection is a pure function of the CAPA result, so the negotiation can be
//! tested without a server.

use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;

use crate::error::{Error, Result};
use crate::types::Capabilities;

type HmacMd5 = Hmac<Md5>;

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN - credentials sent in the AUTH line
    Plain,
    /// CRAM-MD5 - challenge-response
    CramMd5,
}

impl AuthMechanism {
    /// Picks a mechanism from advertised capabilities.
    ///
    /// CRAM-MD5 wins if it appears anywhere in the SASL list. Otherwise PLAIN
    /// is used when the bare `PLAIN` capability is present. Returns `None`
    /// when neither applies.
    #[must_use]
    pub fn select(caps: &Capabilities) -> Option<Self> {
        if caps
            .mechanisms()
            .iter()
            .any(|m| Self::parse(m) == Some(Self::CramMd5))
        {
            Some(Self::CramMd5)
        } else if caps.supports_plain() {
            Some(Self::Plain)
        } else {
            None
        }
    }

    /// Parses an authentication mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "CRAM-MD5" => Some(Self::CramMd5),
            _ => None,
        }
    }

    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::CramMd5 => "CRAM-MD5",
        }
    }
}

/// Credential layout for `AUTH PLAIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlainFraming {
    /// `\0username\0password` as defined by RFC 4616.
    #[default]
    Rfc4616,
    /// Password only, for servers that expect the legacy single-field form.
    PasswordOnly,
}

/// Generates the base64 initial response for `AUTH PLAIN`.
#[must_use]
pub fn plain_response(username: &str, password: &str, framing: PlainFraming) -> String {
    match framing {
        PlainFraming::Rfc4616 => STANDARD.encode(format!("\0{username}\0{password}")),
        PlainFraming::PasswordOnly => STANDARD.encode(password),
    }
}

/// Answers a CRAM-MD5 challenge.
///
/// `challenge` is the base64 text from the server's `+` line. The result is
/// the base64 encoding of `username SP hex(HMAC-MD5(password, challenge))`.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the challenge is not valid base64.
pub fn cram_md5_response(username: &str, password: &str, challenge: &str) -> Result<String> {
    let challenge = STANDARD
        .decode(challenge.trim())
        .map_err(|e| Error::malformed(format!("invalid CRAM-MD5 challenge: {e}")))?;

    let mut mac = HmacMd5::new_from_slice(password.as_bytes())
        .map_err(|e| Error::malformed(format!("invalid CRAM-MD5 key: {e}")))?;
    mac.update(&challenge);
    let digest = mac.finalize().into_bytes();

    let mut response = String::with_capacity(username.len() + 1 + digest.len() * 2);
    response.push_str(username);
    response.push(' ');
    for byte in digest {
        let _ = write!(response, "{byte:02x}");
    }

    Ok(STANDARD.encode(response))
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

    mod select_tests {
        use super::*;

        #[test]
        fn cram_md5_preferred_over_plain() {
            let caps = Capabilities::parse(["SASL CRAM-MD5 PLAIN", "PLAIN"]);
            assert_eq!(AuthMechanism::select(&caps), Some(AuthMechanism::CramMd5));
        }

        #[test]
        fn cram_md5_found_anywhere_in_list() {
            let caps = Capabilities::parse(["SASL LOGIN PLAIN CRAM-MD5"]);
            assert_eq!(AuthMechanism::select(&caps), Some(AuthMechanism::CramMd5));
        }

        #[test]
        fn bare_plain_selects_plain() {
            let caps = Capabilities::parse(["PLAIN"]);
            assert_eq!(AuthMechanism::select(&caps), Some(AuthMechanism::Plain));
        }

        #[test]
        fn sasl_plain_without_flag_is_unsupported() {
            let caps = Capabilities::parse(["SASL PLAIN LOGIN"]);
            assert_eq!(AuthMechanism::select(&caps), None);
        }

        #[test]
        fn empty_capabilities_unsupported() {
            let caps = Capabilities::default();
            assert_eq!(AuthMechanism::select(&caps), None);
        }

        #[test]
        fn table() {
            let cases: &[(&[&str], Option<AuthMechanism>)] = &[
                (&["TOP", "UIDL"], None),
                (&["SASL cram-md5"], Some(AuthMechanism::CramMd5)),
                (&["UIDL", "PLAIN"], Some(AuthMechanism::Plain)),
                (&["SASL XOAUTH2", "PLAIN"], Some(AuthMechanism::Plain)),
            ];
            for (lines, expected) in cases {
                let caps = Capabilities::parse(lines.iter().copied());
                assert_eq!(AuthMechanism::select(&caps), *expected, "{lines:?}");
            }
        }
    }

    mod mechanism_tests {
        use super::*;

        #[test]
        fn parse() {
            assert_eq!(AuthMechanism::parse("PLAIN"), Some(AuthMechanism::Plain));
            assert_eq!(AuthMechanism::parse("plain"), Some(AuthMechanism::Plain));
            assert_eq!(
                AuthMechanism::parse("CRAM-MD5"),
                Some(AuthMechanism::CramMd5)
            );
            assert_eq!(AuthMechanism::parse("LOGIN"), None);
        }

        #[test]
        fn as_str() {
            assert_eq!(AuthMechanism::Plain.as_str(), "PLAIN");
            assert_eq!(AuthMechanism::CramMd5.as_str(), "CRAM-MD5");
        }
    }

    mod response_tests {
        use super::*;

        #[test]
        fn plain_rfc4616() {
            assert_eq!(
                plain_response("user", "pass", PlainFraming::Rfc4616),
                "AHVzZXIAcGFzcw=="
            );
        }

        #[test]
        fn plain_password_only() {
            assert_eq!(
                plain_response("user", "pass", PlainFraming::PasswordOnly),
                "cGFzcw=="
            );
        }

        #[test]
        fn plain_default_is_rfc4616() {
            assert_eq!(PlainFraming::default(), PlainFraming::Rfc4616);
        }

        #[test]
        fn cram_md5_rfc2195_vector() {
            let challenge = "PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2UucmVzdG9uLm1jaS5uZXQ+";
            let response = cram_md5_response("tim", "tanstaaftanstaaf", challenge).unwrap();
            let decoded = String::from_utf8(STANDARD.decode(response).unwrap()).unwrap();
            assert_eq!(decoded, "tim b913a602c7eda7a495b4e6e7334d3890");
        }

        #[test]
        fn cram_md5_bad_challenge() {
            let err = cram_md5_response("tim", "secret", "not base64!").unwrap_err();
            assert!(err.is_malformed());
        }
    }
}
