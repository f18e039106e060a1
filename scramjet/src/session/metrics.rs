//! Session metrics collection.

use std::time::Duration;

/// Counters for one [`PeerSession`](super::PeerSession), across attempts.
///
/// Times are provider time (see `TimeProvider::now`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Total number of `connect()` calls that started an attempt
    pub connect_attempts: u64,

    /// Attempts that reached `Ready`
    pub handshakes_completed: u64,

    /// Attempts that ended in `Failed` before `Ready`
    pub connect_failures: u64,

    /// Frames written to the transport
    pub frames_sent: u64,

    /// Frames delivered to the receiver
    pub frames_received: u64,

    /// Wire bytes written, length prefixes included
    pub bytes_sent: u64,

    /// Payload bytes received, length prefixes excluded
    pub bytes_received: u64,

    /// Time the session was created
    pub created_at: Duration,

    /// Time of the last successful handshake (None if never)
    pub last_handshake: Option<Duration>,

    /// Time of the last failure (None if no failures)
    pub last_failure: Option<Duration>,
}

impl SessionMetrics {
    /// Create new metrics instance with a specific creation time.
    pub fn new_at(created_at: Duration) -> Self {
        Self {
            connect_attempts: 0,
            handshakes_completed: 0,
            connect_failures: 0,
            frames_sent: 0,
            frames_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
            created_at,
            last_handshake: None,
            last_failure: None,
        }
    }

    /// Record a connect attempt.
    pub fn record_connect_attempt(&mut self) {
        self.connect_attempts += 1;
    }

    /// Record a completed handshake at a specific time.
    pub fn record_handshake_at(&mut self, now: Duration) {
        self.handshakes_completed += 1;
        self.last_handshake = Some(now);
    }

    /// Record a failed attempt at a specific time.
    pub fn record_connect_failure_at(&mut self, now: Duration) {
        self.connect_failures += 1;
        self.last_failure = Some(now);
    }

    /// Record a failure after `Ready`.
    pub fn record_failure_at(&mut self, now: Duration) {
        self.last_failure = Some(now);
    }

    /// Record a frame written.
    pub fn record_frame_sent(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a frame received.
    pub fn record_frame_received(&mut self, bytes: usize) {
        self.frames_received += 1;
        self.bytes_received += bytes as u64;
    }

    /// Time since the last handshake.
    pub fn time_since_last_handshake(&self, now: Duration) -> Option<Duration> {
        self.last_handshake.map(|t| now.saturating_sub(t))
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new_at(Duration::ZERO)
    }
}
