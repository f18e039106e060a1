//! Cooperative cancellation for in-flight connect attempts.

use std::rc::Rc;
use tokio::sync::watch;

/// A cloneable, single-shot cancellation flag.
///
/// Aborting does not stop anything by itself: operations racing against
/// [`aborted`](Self::aborted) observe the flag and settle as
/// `OperationAborted`. Once set, the flag stays set.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    tx: Rc<watch::Sender<bool>>,
}

impl AbortSignal {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Rc::new(tx) }
    }

    /// Fire the signal. Returns `true` if this call fired it.
    pub fn abort(&self) -> bool {
        let was_aborted = self.tx.send_replace(true);
        if !was_aborted {
            tracing::debug!("abort signal fired");
        }
        !was_aborted
    }

    /// Whether the signal has fired.
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal fires; immediately if it already has.
    pub async fn aborted(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            // Unreachable while `self` holds the sender.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}
