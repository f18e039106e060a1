//! Operation-versus-deadline race with single-claim completion.
//!
//! The monitored operation runs as its own local task. Whoever settles the
//! race first (the operation, the deadline, or an abort) must win the shared
//! [`CompletionClaim`]; every later claimant is a no-op. The loser is then
//! cancelled explicitly: the task is aborted, the deadline cancelled.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use scramjet_core::{Providers, TaskProvider};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::abort::AbortSignal;
use super::deadline::Deadline;

/// Shared single-shot flag: only the first claimant's outcome counts.
#[derive(Debug, Clone, Default)]
pub struct CompletionClaim(Rc<Cell<bool>>);

impl CompletionClaim {
    /// Create an unclaimed flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to claim. Returns `true` for exactly one caller.
    pub fn try_claim(&self) -> bool {
        !self.0.replace(true)
    }
}

/// How a race settled.
#[derive(Debug, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// The operation finished first.
    Completed(T),
    /// The deadline fired first.
    Expired,
    /// The abort signal fired first.
    Aborted,
}

/// Aborts the operation task if the race is dropped or lost.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Race `operation` against `deadline` and `abort`.
///
/// On `Expired` the deadline is marked expired; on `Aborted` it is
/// cancelled. On `Completed` the deadline is left armed: whether the
/// attempt is over is for the caller to decide.
pub async fn race<P, T, F>(
    providers: &P,
    name: &str,
    deadline: &Deadline<P::Time>,
    abort: &AbortSignal,
    operation: F,
) -> RaceOutcome<T>
where
    P: Providers,
    T: 'static,
    F: Future<Output = T> + 'static,
{
    let claim = CompletionClaim::new();
    let (tx, mut rx) = oneshot::channel();

    // A claim taken by the deadline or the abort is always followed by the
    // guard aborting this task before it can run again.
    let op_claim = claim.clone();
    let _guard = TaskGuard(providers.task().spawn_task(name, async move {
        let result = operation.await;
        if op_claim.try_claim() {
            let _ = tx.send(result);
        }
    }));

    let outcome = tokio::select! {
        biased;

        _ = abort.aborted() => {
            if claim.try_claim() {
                RaceOutcome::Aborted
            } else {
                honour(&mut rx)
            }
        }

        result = &mut rx => {
            match result {
                Ok(value) => RaceOutcome::Completed(value),
                // Task went away without claiming.
                Err(_) => RaceOutcome::Aborted,
            }
        }

        _ = deadline.expired() => {
            if claim.try_claim() {
                RaceOutcome::Expired
            } else {
                honour(&mut rx)
            }
        }
    };

    match &outcome {
        RaceOutcome::Completed(_) => {}
        RaceOutcome::Expired => {
            deadline.mark_expired();
            tracing::debug!(
                "{}: deadline of {:?} fired, cancelling operation",
                name,
                deadline.budget()
            );
        }
        RaceOutcome::Aborted => {
            deadline.cancel();
            tracing::debug!("{}: aborted, cancelling operation", name);
        }
    }

    outcome
}

/// The operation claimed first; its result is already in the channel.
fn honour<T>(rx: &mut oneshot::Receiver<T>) -> RaceOutcome<T> {
    match rx.try_recv() {
        Ok(value) => RaceOutcome::Completed(value),
        Err(_) => RaceOutcome::Aborted,
    }
}
