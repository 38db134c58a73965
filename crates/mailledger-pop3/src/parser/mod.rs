//! POP3 response parser.
//!
//! Pure functions over already-framed lines; all I/O lives in
//! [`crate::connection`].

use crate::error::{Error, Result};
use crate::types::{MaildropStat, MessageSummary, StatusLine, UniqueId};

/// Success marker that opens every positive status line.
pub const SUCCESS_MARKER: char = '+';

/// Line that terminates a multi-line block.
pub const TERMINATOR: &str = ".";

/// Parses a status line.
///
/// - `+OK 2 320` → ok, text `2 320`
/// - `+ PDI4Nj...` → ok, text `PDI4Nj...` (SASL continuation)
/// - `-ERR no such message` → not ok, text `no such message`
/// - `-ERR` → not ok, text `-ERR`
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] for an empty line.
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let Some(first) = line.chars().next() else {
        return Err(Error::malformed("empty status line"));
    };

    let rest = line.split_once(' ').map(|(_, rest)| rest);

    if first == SUCCESS_MARKER {
        Ok(StatusLine::ok(rest.unwrap_or_default()))
    } else {
        Ok(StatusLine::err(rest.unwrap_or(line)))
    }
}

/// Returns true if the line ends a multi-line block.
#[must_use]
pub fn is_terminator(line: &str) -> bool {
    line == TERMINATOR
}

/// Undoes byte-stuffing on a block line.
///
/// Exactly one leading dot is removed from any line that starts with one,
/// whether or not the server doubled it.
#[must_use]
pub fn unstuff_line(line: &str) -> &str {
    line.strip_prefix('.').unwrap_or(line)
}

/// Parses a STAT payload: `<count> <size>`.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if either field is missing or not numeric.
pub fn parse_stat(payload: &str) -> Result<MaildropStat> {
    let mut fields = payload.split_whitespace();
    let count = parse_field(fields.next(), payload)?;
    let total_size = parse_field(fields.next(), payload)?;
    Ok(MaildropStat { count, total_size })
}

/// Parses a scan listing: `<id> <size>`, from a LIST reply or block line.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if either field is missing or not numeric.
pub fn parse_scan_listing(line: &str) -> Result<MessageSummary> {
    let mut fields = line.split_whitespace();
    let id = parse_field(fields.next(), line)?;
    let size = parse_field(fields.next(), line)?;
    Ok(MessageSummary { id, size })
}

/// Parses a unique-id listing: `<id> <uid>`.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the id is not numeric or the uid is missing.
pub fn parse_unique_id(line: &str) -> Result<UniqueId> {
    let mut fields = line.split_whitespace();
    let id = parse_field(fields.next(), line)?;
    let uid = fields
        .next()
        .ok_or_else(|| Error::malformed(format!("missing unique id: {line}")))?
        .to_string();
    Ok(UniqueId { id, uid })
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, line: &str) -> Result<T> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::malformed(format!("invalid numeric field: {line}")))
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
    fn test_parse_ok_with_text() {
        let status = parse_status_line("+OK 2 320").unwrap();
        assert!(status.ok);
        assert_eq!(status.text, "2 320");
    }

    #[test]
    fn test_parse_ok_without_text() {
        let status = parse_status_line("+OK").unwrap();
        assert!(status.ok);
        assert_eq!(status.text, "");
    }

    #[test]
    fn test_parse_sasl_continuation() {
        let status = parse_status_line("+ PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2U+").unwrap();
        assert!(status.ok);
        assert_eq!(status.text, "PDE4OTYuNjk3MTcwOTUyQHBvc3RvZmZpY2U+");
    }

    #[test]
    fn test_parse_err_with_text() {
        let status = parse_status_line("-ERR no such message").unwrap();
        assert!(!status.ok);
        assert_eq!(status.text, "no such message");
    }

    #[test]
    fn test_parse_err_without_space_keeps_whole_line() {
        let status = parse_status_line("-ERR").unwrap();
        assert!(!status.ok);
        assert_eq!(status.text, "-ERR");
    }

    #[test]
    fn test_parse_garbage_is_failure() {
        let status = parse_status_line("hello world").unwrap();
        assert!(!status.ok);
        assert_eq!(status.text, "world");
    }

    #[test]
    fn test_parse_empty_is_malformed() {
        assert!(parse_status_line("").unwrap_err().is_malformed());
    }

    #[test]
    fn test_terminator() {
        assert!(is_terminator("."));
        assert!(!is_terminator(".."));
        assert!(!is_terminator(". "));
        assert!(!is_terminator(""));
    }

    #[test]
    fn test_unstuff() {
        assert_eq!(unstuff_line(".hello"), "hello");
        assert_eq!(unstuff_line(".."), ".");
        assert_eq!(unstuff_line("..signature"), ".signature");
        assert_eq!(unstuff_line("plain"), "plain");
        assert_eq!(unstuff_line(""), "");
    }

    #[test]
    fn test_parse_stat() {
        let stat = parse_stat("5 2048").unwrap();
        assert_eq!(stat.count, 5);
        assert_eq!(stat.total_size, 2048);
    }

    #[test]
    fn test_parse_stat_ignores_extra_text() {
        let stat = parse_stat("2 320 messages").unwrap();
        assert_eq!(stat, MaildropStat { count: 2, total_size: 320 });
    }

    #[test]
    fn test_parse_stat_non_numeric() {
        assert!(parse_stat("abc 10").unwrap_err().is_malformed());
        assert!(parse_stat("10 abc").unwrap_err().is_malformed());
    }

    #[test]
    fn test_parse_stat_missing_field() {
        assert!(parse_stat("5").unwrap_err().is_malformed());
        assert!(parse_stat("").unwrap_err().is_malformed());
    }

    #[test]
    fn test_parse_scan_listing() {
        let summary = parse_scan_listing("3 512").unwrap();
        assert_eq!(summary, MessageSummary { id: 3, size: 512 });
    }

    #[test]
    fn test_parse_scan_listing_malformed() {
        assert!(parse_scan_listing("3").is_err());
        assert!(parse_scan_listing("x 512").is_err());
        assert!(parse_scan_listing("-1 512").is_err());
    }

    #[test]
    fn test_parse_unique_id() {
        let uid = parse_unique_id("1 whqtswO00WBw418f9t5JxYwZ").unwrap();
        assert_eq!(uid.id, 1);
        assert_eq!(uid.uid, "whqtswO00WBw418f9t5JxYwZ");
    }

    #[test]
    fn test_parse_unique_id_missing() {
        assert!(parse_unique_id("1").unwrap_err().is_malformed());
    }
}
