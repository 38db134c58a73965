//! POP3 status line.

use crate::error::{Error, Result};

/// Single-line server status (`+OK ...` / `-ERR ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// True if the line carried the success marker.
    pub ok: bool,
    /// Text following the status token.
    pub text: String,
}

impl StatusLine {
    /// Creates a success status.
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    /// Creates a failure status.
    #[must_use]
    pub fn err(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }

    /// Converts a failure status into [`Error::Protocol`].
    ///
    /// # Errors
    ///
    /// Returns the server text as a protocol error if the status is not `ok`.
    pub fn into_result(self) -> Result<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(Error::Protocol(self.text))
        }
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

    #[test]
    fn test_ok_into_result() {
        let status = StatusLine::ok("2 320").into_result().unwrap();
        assert_eq!(status.text, "2 320");
    }

    #[test]
    fn test_err_into_result() {
        let err = StatusLine::err("no such message").into_result().unwrap_err();
        assert!(matches!(err, Error::Protocol(ref text) if text == "no such message"));
    }
}
