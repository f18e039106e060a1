//! # scramjet
//!
//! Client-side transport for the jet pub/sub/state protocol.
//!
//! This crate provides:
//! - **Version**: the 12-byte `major.minor.patch` record and its
//!   compatibility gate
//! - **Wire format**: `[length:4][type:1][body]` framing and an incremental
//!   [`FrameReader`]
//! - **Connector**: resolve + connect raced against a deadline, with
//!   explicit cancellation of the loser
//! - **PeerSession**: connect, version handshake, then a steady-state
//!   message stream
//!
//! Everything runs on one thread. Suspension points go through the
//! provider traits re-exported from `scramjet_core`, so the same session
//! code runs over TCP or over in-memory transports.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use scramjet_core::{
    EndpointParseError, EndpointSpec, NetworkProvider, Providers, TaskProvider, TimeError,
    TimeProvider, TokioNetworkProvider, TokioProviders, TokioTaskProvider, TokioTimeProvider,
};

// =============================================================================
// Modules
// =============================================================================

/// Connection establishment under a deadline.
pub mod connector;

/// Error types for the version gate and sessions.
pub mod error;

/// Peer session lifecycle.
pub mod session;

/// Protocol version record.
pub mod version;

/// Length-prefixed framing.
pub mod wire;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use connector::{AbortSignal, ConnectError, Connector, Deadline, DeadlineState, PhaseBudget};
pub use error::{SessionError, SessionResult, VersionError};
pub use session::{
    ConnectionState, DisconnectHandle, PeerSession, SessionConfig, SessionMetrics,
    SessionReceiver,
};
pub use version::{SUPPORTED_VERSION, VERSION_SIZE, Version, is_compatible};
pub use wire::{
    Frame, FrameReader, FramingError, LENGTH_PREFIX_SIZE, MAX_FRAME_SIZE, MessageType,
    encode_frame,
};
