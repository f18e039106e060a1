//! Single-shot deadline timer for one connect attempt.

use std::cell::Cell;
use std::time::Duration;

use scramjet_core::TimeProvider;
use serde::{Deserialize, Serialize};

/// Lifecycle of a [`Deadline`]. Leaves `Armed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineState {
    /// Running; may still fire.
    Armed,
    /// Cancelled before firing (success or explicit abort).
    Cancelled,
    /// Fired and acted upon.
    Expired,
}

/// How the connect phase is budgeted once resolution has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseBudget {
    /// Re-arm the full timeout for the connect phase.
    #[default]
    Fresh,
    /// Carry over whatever resolution left of the timeout.
    Remaining,
}

/// A timer racing one phase of a connect attempt.
///
/// Time is read through a [`TimeProvider`], so the deadline follows a
/// paused clock in tests.
#[derive(Debug)]
pub struct Deadline<T: TimeProvider> {
    time: T,
    budget: Duration,
    armed_at: Duration,
    state: Cell<DeadlineState>,
}

impl<T: TimeProvider> Deadline<T> {
    /// Arm a deadline `budget` from now.
    pub fn start(time: T, budget: Duration) -> Self {
        let armed_at = time.now();
        Self {
            time,
            budget,
            armed_at,
            state: Cell::new(DeadlineState::Armed),
        }
    }

    /// Total budget this deadline was armed with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline fires. Zero once passed.
    pub fn remaining(&self) -> Duration {
        let elapsed = self.time.now().saturating_sub(self.armed_at);
        self.budget.saturating_sub(elapsed)
    }

    /// Current state.
    pub fn state(&self) -> DeadlineState {
        self.state.get()
    }

    /// Cancel the deadline. Returns `true` if this call cancelled it;
    /// cancelling a deadline that already left `Armed` is a no-op.
    pub fn cancel(&self) -> bool {
        self.settle(DeadlineState::Cancelled)
    }

    /// Record that the deadline fired and won its race.
    pub(crate) fn mark_expired(&self) -> bool {
        self.settle(DeadlineState::Expired)
    }

    fn settle(&self, to: DeadlineState) -> bool {
        if self.state.get() != DeadlineState::Armed {
            return false;
        }
        self.state.set(to);
        true
    }

    /// Resolve when the budget runs out.
    ///
    /// Never resolves for a deadline that is no longer armed, so a stale
    /// timer cannot fire into later state.
    pub async fn expired(&self) {
        if self.state() != DeadlineState::Armed {
            return std::future::pending().await;
        }
        if self.time.sleep(self.remaining()).await.is_err() {
            return std::future::pending().await;
        }
    }

    /// Arm the deadline for the next phase of the same attempt.
    pub fn next_phase(&self, budget: PhaseBudget) -> Self {
        let next = match budget {
            PhaseBudget::Fresh => self.budget,
            PhaseBudget::Remaining => self.remaining(),
        };
        Self::start(self.time.clone(), next)
    }
}
