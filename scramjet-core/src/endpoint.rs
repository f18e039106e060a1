//! Remote endpoint addressing.

use serde::{Deserialize, Serialize};

/// Host and port of a remote peer, before resolution.
///
/// The host may be a DNS name or a literal IPv4/IPv6 address; resolution
/// is deferred to the [`NetworkProvider`](crate::NetworkProvider).
///
/// # Examples
///
/// ```
/// use scramjet_core::EndpointSpec;
///
/// let endpoint = EndpointSpec::parse("localhost:11122").expect("parse");
/// assert_eq!(endpoint.host(), "localhost");
/// assert_eq!(endpoint.port(), 11122);
///
/// let v6 = EndpointSpec::parse("[::1]:11122").expect("parse");
/// assert_eq!(v6.to_string(), "[::1]:11122");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointSpec {
    host: String,
    port: u16,
}

impl EndpointSpec {
    /// Create an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or literal address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse from `host:port` format.
    ///
    /// IPv6 literals must use bracket notation (`[::1]:11122`).
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the port is missing or invalid.
    pub fn parse(s: &str) -> Result<Self, EndpointParseError> {
        let (host, port_str) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or(EndpointParseError::MissingPort)?;
            let port_str = after
                .strip_prefix(':')
                .ok_or(EndpointParseError::MissingPort)?;
            (host, port_str)
        } else {
            s.rsplit_once(':')
                .ok_or(EndpointParseError::MissingPort)?
        };

        if host.is_empty() {
            return Err(EndpointParseError::EmptyHost);
        }
        let port: u16 = port_str
            .parse()
            .map_err(|_| EndpointParseError::InvalidPort)?;

        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl std::str::FromStr for EndpointSpec {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error parsing an endpoint from string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointParseError {
    /// No `:port` suffix was found.
    #[error("missing port")]
    MissingPort,

    /// The port is not a valid u16.
    #[error("invalid port")]
    InvalidPort,

    /// Nothing precedes the port separator.
    #[error("empty host")]
    EmptyHost,
}
