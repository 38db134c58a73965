//! Connection configuration types.

use std::time::Duration;

use crate::auth::PlainFraming;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (port 110). **Not recommended for production.**
    None,
    /// TLS from the start (port 995). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 110,
            Self::Implicit => 995,
        }
    }
}

/// POP3 connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Connection timeout. Applies to dialing only, never to commands.
    pub connect_timeout: Duration,
    /// Send a bare CRLF before reading the greeting.
    pub handshake_probe: bool,
    /// Credential layout used by `AUTH PLAIN`.
    pub plain_framing: PlainFraming,
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 995.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
    handshake_probe: bool,
    plain_framing: PlainFraming,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Implicit,
            connect_timeout: Duration::from_secs(30),
            handshake_probe: false,
            plain_framing: PlainFraming::Rfc4616,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sends a bare CRLF before reading the greeting.
    #[must_use]
    pub const fn handshake_probe(mut self, probe: bool) -> Self {
        self.handshake_probe = probe;
        self
    }

    /// Sets the `AUTH PLAIN` credential layout.
    #[must_use]
    pub const fn plain_framing(mut self, framing: PlainFraming) -> Self {
        self.plain_framing = framing;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            connect_timeout: self.connect_timeout,
            handshake_probe: self.handshake_probe,
            plain_framing: self.plain_framing,
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
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 110);
        assert_eq!(Security::Implicit.default_port(), 995);
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("pop.example.com");
        assert_eq!(config.host, "pop.example.com");
        assert_eq!(config.port, 995);
        assert_eq!(config.security, Security::Implicit);
        assert!(!config.handshake_probe);
        assert_eq!(config.plain_framing, PlainFraming::Rfc4616);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("pop.example.com")
            .port(1995)
            .security(Security::Implicit)
            .connect_timeout(Duration::from_secs(10))
            .handshake_probe(true)
            .plain_framing(PlainFraming::PasswordOnly)
            .build();

        assert_eq!(config.port, 1995);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.handshake_probe);
        assert_eq!(config.plain_framing, PlainFraming::PasswordOnly);
    }

    #[test]
    fn test_config_builder_default_port() {
        let config = Config::builder("pop.example.com")
            .security(Security::None)
            .build();

        assert_eq!(config.port, 110);
    }
}
