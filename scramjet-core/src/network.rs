//! Network provider abstraction.
//!
//! The connector needs exactly two network operations: turn a host name
//! into candidate socket addresses, and open a byte stream to one of them.
//! Everything after that is plain [`AsyncRead`] + [`AsyncWrite`].

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::instrument;

/// Provider trait for resolving endpoints and opening transports.
///
/// Single-core design - no Send bounds needed.
/// Clone allows sharing providers across connect attempts cheaply.
#[async_trait(?Send)]
pub trait NetworkProvider: Clone {
    /// The byte-stream transport produced by [`NetworkProvider::connect`].
    type Transport: AsyncRead + AsyncWrite + Unpin + 'static;

    /// Resolve `host:port` into candidate addresses, in preference order.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;

    /// Open a transport to a single resolved address.
    async fn connect(&self, addr: SocketAddr) -> io::Result<Self::Transport>;
}

/// Real Tokio TCP networking.
#[derive(Debug, Clone)]
pub struct TokioNetworkProvider;

impl TokioNetworkProvider {
    /// Create a new Tokio network provider.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioNetworkProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl NetworkProvider for TokioNetworkProvider {
    type Transport = tokio::net::TcpStream;

    #[instrument(skip(self))]
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.collect())
    }

    #[instrument(skip(self))]
    async fn connect(&self, addr: SocketAddr) -> io::Result<Self::Transport> {
        let stream = tokio::net::TcpStream::connect(addr).await?;
        // Frames are small and latency-sensitive.
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
