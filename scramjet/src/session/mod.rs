//! Peer session lifecycle.
//!
//! A [`PeerSession`] owns one logical connection to a jet peer, from
//! resolution to teardown.
//!
//! # Connection Lifecycle
//!
//! ```text
//! ┌──────┐ connect ┌───────────┐     ┌────────────┐     ┌─────────────────┐
//! │ Idle ├────────►│ Resolving ├────►│ Connecting ├────►│ AwaitingVersion │
//! └──────┘         └─────┬─────┘     └─────┬──────┘     └────────┬────────┘
//!                        │ error           │ error               │ version ok
//!                        ▼                 ▼                     ▼
//!                  ┌──────────┐      ┌──────────┐           ┌─────────┐
//!                  │  Failed  │◄─────┤  Failed  │◄──────────┤  Ready  │
//!                  └──────────┘      └──────────┘ read error└────┬────┘
//!                                                                │ disconnect
//!                                                                ▼
//!                                                           ┌─────────┐
//!                                                           │ Closed  │
//!                                                           └─────────┘
//! ```
//!
//! A disconnect from any non-terminal state ends in `Closed`. `Closed` and
//! `Failed` only move again through a new `connect()`; there is no
//! automatic retry.
//!
//! # Handshake
//!
//! The first frame from the peer must be a version announcement (type `1`,
//! 12-byte body) whose version passes the compatibility gate. Anything else
//! closes the transport before the error is reported.
//!
//! # Configuration
//!
//! ```ignore
//! use scramjet::{PhaseBudget, SessionConfig};
//!
//! let config = SessionConfig::default()
//!     .with_connect_timeout(Duration::from_millis(100))
//!     .with_phase_budget(PhaseBudget::Remaining);
//! ```

/// Session implementation and its connection task
pub mod core;

/// Configuration structures for session behavior
pub mod config;

/// Version announcement check
pub mod handshake;

/// Metrics collection
pub mod metrics;

/// Lifecycle states
pub mod state;

// Re-export main types
pub use config::SessionConfig;
pub use self::core::{DisconnectHandle, PeerSession, SessionReceiver};
pub use handshake::verify_version_announcement;
pub use metrics::SessionMetrics;
pub use state::ConnectionState;
