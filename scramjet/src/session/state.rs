//! Connection lifecycle states.

use crate::error::SessionError;

/// Where a [`PeerSession`](super::PeerSession) is in its lifecycle.
///
/// ```text
/// Idle -> Resolving -> Connecting -> AwaitingVersion -> Ready
///   \________\____________\_______________\_____________\-> Closed | Failed
/// ```
///
/// `Closed` and `Failed` are terminal for an attempt; only a new
/// `connect()` leaves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, never connected.
    Idle,
    /// Resolving the endpoint.
    Resolving,
    /// Opening the transport.
    Connecting,
    /// Transport open, waiting for the version announcement.
    AwaitingVersion,
    /// Handshake done; frames flow to the receiver.
    Ready,
    /// Disconnected on request.
    Closed,
    /// Stopped by an error.
    Failed(SessionError),
}

impl ConnectionState {
    /// `Closed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }

    /// Between `connect()` being called and `Ready`.
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            Self::Resolving | Self::Connecting | Self::AwaitingVersion
        )
    }

    /// Handshake complete.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether `connect()` may be called from here.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Idle) || self.is_terminal()
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Connecting => write!(f, "connecting"),
            Self::AwaitingVersion => write!(f, "awaiting-version"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
            Self::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}
