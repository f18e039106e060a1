//! # scramjet-core
//!
//! Runtime abstractions for the scramjet transport.
//!
//! The protocol engine in the `scramjet` crate never talks to tokio directly.
//! Every suspension point (address resolution, connect, timers, spawning)
//! goes through one of the provider traits below, so the same session code
//! runs against real sockets in production and against scripted in-memory
//! transports in tests.
//!
//! ## Provider Traits
//!
//! - [`TimeProvider`]: Sleep, timeout, and time operations
//! - [`TaskProvider`]: Task spawning for single-threaded environments
//! - [`NetworkProvider`]: Address resolution and byte-stream connections
//! - [`Providers`]: Bundle of the three above
//!
//! ## Addressing
//!
//! - [`EndpointSpec`]: Host name (or literal IP) + port of a remote peer

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod endpoint;
mod network;
mod providers;
mod task;
mod time;

pub use endpoint::{EndpointParseError, EndpointSpec};
pub use network::{NetworkProvider, TokioNetworkProvider};
pub use providers::{Providers, TokioProviders};
pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
