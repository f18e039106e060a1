//! Error types for the version gate and session operations.

use std::time::Duration;
use thiserror::Error;

use crate::connector::ConnectError;
use crate::version::Version;
use crate::wire::FramingError;

/// Reasons a version announcement is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The first frame was not a version announcement.
    #[error("unsupported message type {tag} during handshake")]
    UnsupportedType {
        /// Tag the peer sent.
        tag: u8,
    },

    /// The announcement body has the wrong length.
    #[error("version body is {actual} bytes, expected {expected}")]
    WrongSize {
        /// Encoded version size.
        expected: usize,
        /// Body length received.
        actual: usize,
    },

    /// The peer's version fails the compatibility gate.
    #[error("peer version {advertised} is incompatible with required {required}")]
    Incompatible {
        /// What the peer announced.
        advertised: Version,
        /// What this side requires.
        required: Version,
    },
}

/// Errors surfaced by [`PeerSession`](crate::PeerSession).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Resolution or connection establishment failed.
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),

    /// Reading or writing a frame failed.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The version handshake rejected the peer.
    #[error("version handshake failed: {0}")]
    Version(#[from] VersionError),

    /// No version announcement arrived in time.
    #[error("no version announcement within {0:?}")]
    HandshakeTimeout(Duration),

    /// Operation not valid in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The session is not in `Ready`.
    #[error("session is not connected")]
    NotConnected,

    /// The receiver has been taken via `take_receiver()`.
    #[error("receiver has been taken")]
    ReceiverTaken,

    /// The message stream ended.
    #[error("session disconnected")]
    Disconnected,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
