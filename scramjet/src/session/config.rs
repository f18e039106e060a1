//! Configuration structures for session behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::connector::PhaseBudget;
use crate::version::{SUPPORTED_VERSION, Version};
use crate::wire::MAX_FRAME_SIZE;

/// Configuration for a [`PeerSession`](super::PeerSession).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for each connect phase (resolve, establish)
    pub connect_timeout: Duration,

    /// How the establish phase is budgeted once resolution finishes
    pub phase_budget: PhaseBudget,

    /// Maximum wait for the peer's version announcement
    pub handshake_timeout: Duration,

    /// Protocol version this side requires of the peer
    pub required_version: Version,

    /// Upper bound on a frame's declared length
    pub max_frame_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            phase_budget: PhaseBudget::Fresh,
            handshake_timeout: Duration::from_secs(5),
            required_version: SUPPORTED_VERSION,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with explicit timeouts and defaults elsewhere.
    pub fn new(connect_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            handshake_timeout,
            ..Self::default()
        }
    }

    /// Set the connect-phase deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set how the establish phase is budgeted.
    pub fn with_phase_budget(mut self, phase_budget: PhaseBudget) -> Self {
        self.phase_budget = phase_budget;
        self
    }

    /// Set the handshake deadline.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the version required of the peer.
    pub fn with_required_version(mut self, version: Version) -> Self {
        self.required_version = version;
        self
    }

    /// Set the maximum frame size.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Create a configuration for low-latency local networking.
    pub fn local_network() -> Self {
        Self {
            connect_timeout: Duration::from_millis(100),
            handshake_timeout: Duration::from_secs(1),
            ..Self::default()
        }
    }

    /// Create a configuration for high-latency WAN networking.
    pub fn wan_network() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
            ..Self::default()
        }
    }
}
