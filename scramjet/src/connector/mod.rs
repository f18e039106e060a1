//! Endpoint resolution and transport establishment under a deadline.
//!
//! A connect attempt has two phases, each raced against a [`Deadline`]:
//!
//! 1. **Resolve**: `host:port` to candidate socket addresses.
//! 2. **Establish**: try each address in order until one accepts.
//!
//! Between phases the deadline is re-armed according to [`PhaseBudget`].
//! Every phase also races an [`AbortSignal`] so an explicit disconnect can
//! cut an attempt short.

mod abort;
mod deadline;
mod race;

pub use abort::AbortSignal;
pub use deadline::{Deadline, DeadlineState, PhaseBudget};
pub use race::{CompletionClaim, RaceOutcome, race};

use std::net::SocketAddr;
use std::time::Duration;

use scramjet_core::{EndpointSpec, NetworkProvider, Providers};
use thiserror::Error;

/// Transport type produced by a providers bundle.
pub type TransportOf<P> = <<P as Providers>::Network as NetworkProvider>::Transport;

/// Why a connect attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The deadline fired before the current phase finished.
    #[error("connect timed out")]
    Timeout,

    /// Resolution failed or produced no addresses.
    #[error("host not found")]
    HostNotFound,

    /// Every resolved address refused the connection.
    #[error("connection refused")]
    ConnectionRefused,

    /// The attempt was cancelled by an explicit disconnect.
    #[error("operation aborted")]
    OperationAborted,
}

/// Drives one connect attempt at a time over a [`Providers`] bundle.
#[derive(Debug, Clone)]
pub struct Connector<P: Providers> {
    providers: P,
    phase_budget: PhaseBudget,
}

impl<P: Providers> Connector<P> {
    /// Create a connector that re-arms the full timeout per phase.
    pub fn new(providers: P) -> Self {
        Self {
            providers,
            phase_budget: PhaseBudget::default(),
        }
    }

    /// Set how the connect phase is budgeted after resolution.
    pub fn with_phase_budget(mut self, phase_budget: PhaseBudget) -> Self {
        self.phase_budget = phase_budget;
        self
    }

    /// Configured phase budget.
    pub fn phase_budget(&self) -> PhaseBudget {
        self.phase_budget
    }

    /// Resolve `endpoint`, racing `deadline` and `abort`.
    ///
    /// Cancels the deadline on success. An empty address list counts as
    /// `HostNotFound`.
    pub async fn resolve(
        &self,
        endpoint: &EndpointSpec,
        deadline: &Deadline<P::Time>,
        abort: &AbortSignal,
    ) -> Result<Vec<SocketAddr>, ConnectError> {
        let network = self.providers.network().clone();
        let host = endpoint.host().to_string();
        let port = endpoint.port();

        tracing::debug!("connector: resolving {}", endpoint);
        let outcome = race(&self.providers, "resolve", deadline, abort, async move {
            network.resolve(&host, port).await
        })
        .await;

        match outcome {
            RaceOutcome::Completed(Ok(addrs)) if !addrs.is_empty() => {
                deadline.cancel();
                tracing::debug!("connector: {} resolved to {:?}", endpoint, addrs);
                Ok(addrs)
            }
            RaceOutcome::Completed(Ok(_)) => {
                deadline.cancel();
                tracing::debug!("connector: {} resolved to no addresses", endpoint);
                Err(ConnectError::HostNotFound)
            }
            RaceOutcome::Completed(Err(e)) => {
                deadline.cancel();
                tracing::debug!("connector: resolving {} failed: {}", endpoint, e);
                Err(ConnectError::HostNotFound)
            }
            RaceOutcome::Expired => Err(ConnectError::Timeout),
            RaceOutcome::Aborted => Err(ConnectError::OperationAborted),
        }
    }

    /// Connect to the first address in `addrs` that accepts, in order,
    /// racing `deadline` and `abort` throughout.
    ///
    /// Cancels the deadline on success and when every address refused.
    pub async fn establish(
        &self,
        addrs: &[SocketAddr],
        deadline: &Deadline<P::Time>,
        abort: &AbortSignal,
    ) -> Result<TransportOf<P>, ConnectError> {
        for &addr in addrs {
            let network = self.providers.network().clone();

            tracing::debug!("connector: connecting to {}", addr);
            let outcome = race(&self.providers, "connect", deadline, abort, async move {
                network.connect(addr).await
            })
            .await;

            match outcome {
                RaceOutcome::Completed(Ok(transport)) => {
                    deadline.cancel();
                    tracing::debug!("connector: connected to {}", addr);
                    return Ok(transport);
                }
                RaceOutcome::Completed(Err(e)) => {
                    tracing::debug!("connector: connect to {} failed: {}", addr, e);
                }
                RaceOutcome::Expired => return Err(ConnectError::Timeout),
                RaceOutcome::Aborted => return Err(ConnectError::OperationAborted),
            }
        }

        deadline.cancel();
        Err(ConnectError::ConnectionRefused)
    }

    /// Resolve then establish, with one overall `timeout` per phase budget.
    pub async fn connect(
        &self,
        endpoint: &EndpointSpec,
        timeout: Duration,
    ) -> Result<TransportOf<P>, ConnectError> {
        self.connect_with_abort(endpoint, timeout, &AbortSignal::new())
            .await
    }

    /// [`connect`](Self::connect) that can be cancelled through `abort`.
    pub async fn connect_with_abort(
        &self,
        endpoint: &EndpointSpec,
        timeout: Duration,
        abort: &AbortSignal,
    ) -> Result<TransportOf<P>, ConnectError> {
        let deadline = Deadline::start(self.providers.time().clone(), timeout);
        let addrs = self.resolve(endpoint, &deadline, abort).await?;

        let deadline = deadline.next_phase(self.phase_budget);
        self.establish(&addrs, &deadline, abort).await
    }
}
