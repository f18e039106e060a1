//! Provider bundle trait for simplified type parameters.
//!
//! Without bundling, every session type carries three parameters:
//!
//! ```text
//! struct PeerSession<N, T, TP>
//! where
//!     N: NetworkProvider + Clone + 'static,
//!     T: TimeProvider + Clone + 'static,
//!     TP: TaskProvider + Clone + 'static,
//! ```
//!
//! With bundling, this simplifies to `struct PeerSession<P: Providers>`.

use crate::{
    NetworkProvider, TaskProvider, TimeProvider, TokioNetworkProvider, TokioTaskProvider,
    TokioTimeProvider,
};

/// Bundle of all provider types for a runtime environment.
///
/// ## Implementations
///
/// - [`TokioProviders`]: Production providers using real Tokio networking
/// - Test bundles pairing a scripted network with Tokio time and tasks
pub trait Providers: Clone + 'static {
    /// Network provider type for resolution and transports.
    type Network: NetworkProvider + Clone + 'static;

    /// Time provider type for sleep, timeout, and time queries.
    type Time: TimeProvider + Clone + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + Clone + 'static;

    /// Get the network provider instance.
    fn network(&self) -> &Self::Network;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;
}

/// Production providers using Tokio runtime.
///
/// ```rust,ignore
/// use scramjet_core::{Providers, TokioProviders};
///
/// let providers = TokioProviders::new();
/// let started = providers.time().now();
/// ```
#[derive(Clone, Debug, Default)]
pub struct TokioProviders {
    network: TokioNetworkProvider,
    time: TokioTimeProvider,
    task: TokioTaskProvider,
}

impl TokioProviders {
    /// Create a new production providers bundle.
    pub fn new() -> Self {
        Self {
            network: TokioNetworkProvider::new(),
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
        }
    }
}

impl Providers for TokioProviders {
    type Network = TokioNetworkProvider;
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;

    fn network(&self) -> &Self::Network {
        &self.network
    }

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }
}
