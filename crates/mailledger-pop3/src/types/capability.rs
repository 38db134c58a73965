//! Server capabilities from CAPA (RFC 2449).

/// Capabilities advertised by a CAPA response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Raw capability lines, in server order.
    pub lines: Vec<String>,
    /// Mechanisms from `SASL` lines, in server order.
    pub sasl: Vec<String>,
    /// Set by a bare `PLAIN` capability line.
    pub plain: bool,
}

impl Capabilities {
    /// Builds capabilities from the lines of a CAPA block.
    ///
    /// A line whose first token is `SASL` contributes the remaining tokens
    /// to [`Self::sasl`]. A line that is exactly `PLAIN` sets [`Self::plain`].
    /// All lines are kept in [`Self::lines`].
    #[must_use]
    pub fn parse<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut caps = Self::default();

        for line in lines {
            let line = line.into();
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some(tag) if tag.eq_ignore_ascii_case("SASL") => {
                    caps.sasl.extend(tokens.map(str::to_string));
                }
                Some(tag) if tag == "PLAIN" && tokens.next().is_none() => {
                    caps.plain = true;
                }
                _ => {}
            }
            caps.lines.push(line);
        }

        caps
    }

    /// Returns the SASL mechanisms in server order.
    #[must_use]
    pub fn mechanisms(&self) -> &[String] {
        &self.sasl
    }

    /// Checks if a SASL mechanism is advertised.
    #[must_use]
    pub fn has_mechanism(&self, name: &str) -> bool {
        self.sasl.iter().any(|m| m.eq_ignore_ascii_case(name))
    }

    /// Checks if a capability keyword is advertised (first token, case-insensitive).
    #[must_use]
    pub fn has(&self, keyword: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|tag| tag.eq_ignore_ascii_case(keyword))
        })
    }

    /// Returns true if the bare `PLAIN` capability was advertised.
    #[must_use]
    pub const fn supports_plain(&self) -> bool {
        self.plain
    }

    /// Returns true if TOP is advertised.
    #[must_use]
    pub fn supports_top(&self) -> bool {
        self.has("TOP")
    }

    /// Returns true if UIDL is advertised.
    #[must_use]
    pub fn supports_uidl(&self) -> bool {
        self.has("UIDL")
    }

    /// Returns true if no capability lines were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
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
    fn test_parse_sasl_and_plain() {
        let caps = Capabilities::parse(["SASL CRAM-MD5 PLAIN", "PLAIN"]);
        assert_eq!(caps.mechanisms(), ["CRAM-MD5", "PLAIN"]);
        assert!(caps.supports_plain());
        assert_eq!(caps.lines.len(), 2);
    }

    #[test]
    fn test_sasl_plain_does_not_set_flag() {
        let caps = Capabilities::parse(["SASL PLAIN"]);
        assert!(caps.has_mechanism("plain"));
        assert!(!caps.supports_plain());
    }

    #[test]
    fn test_multiple_sasl_lines_extend() {
        let caps = Capabilities::parse(["SASL LOGIN", "SASL CRAM-MD5"]);
        assert_eq!(caps.mechanisms(), ["LOGIN", "CRAM-MD5"]);
    }

    #[test]
    fn test_other_lines_retained() {
        let caps = Capabilities::parse(["TOP", "UIDL", "RESP-CODES", "EXPIRE NEVER"]);
        assert!(caps.sasl.is_empty());
        assert!(!caps.plain);
        assert!(caps.supports_top());
        assert!(caps.supports_uidl());
        assert!(caps.has("expire"));
        assert_eq!(caps.lines.len(), 4);
    }

    #[test]
    fn test_empty() {
        let caps = Capabilities::parse(Vec::<String>::new());
        assert!(caps.is_empty());
        assert!(!caps.supports_top());
    }

    #[test]
    fn test_sasl_prefix_requires_whole_token() {
        let caps = Capabilities::parse(["SASLX CRAM-MD5"]);
        assert!(caps.sasl.is_empty());
    }
}
