//! Shared fixtures: a scripted in-memory network and a providers bundle
//! built around it.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use scramjet::{
    EndpointSpec, MAX_FRAME_SIZE, MessageType, NetworkProvider, Providers, SUPPORTED_VERSION,
    TokioTaskProvider, TokioTimeProvider, Version, encode_frame,
};
use tokio::io::DuplexStream;

/// What `resolve` answers.
#[derive(Debug, Clone)]
pub enum Resolution {
    Addrs(Vec<SocketAddr>),
    Fail,
}

/// Behaviour and call log of a [`ScriptedNetwork`].
#[derive(Debug)]
pub struct Script {
    pub resolve_delay: Duration,
    pub resolution: Resolution,
    pub connect_delay: Duration,
    pub refused: Vec<SocketAddr>,
    /// Client halves handed out by successful connects, in order.
    pub transports: VecDeque<DuplexStream>,

    pub resolve_calls: usize,
    pub resolves_completed: usize,
    pub connect_calls: Vec<SocketAddr>,
    pub connects_completed: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            resolve_delay: Duration::ZERO,
            resolution: Resolution::Addrs(vec![addr(1)]),
            connect_delay: Duration::ZERO,
            refused: Vec::new(),
            transports: VecDeque::new(),
            resolve_calls: 0,
            resolves_completed: 0,
            connect_calls: Vec::new(),
            connects_completed: 0,
        }
    }
}

/// Network provider whose latency and failures are set by the test.
#[derive(Clone, Default)]
pub struct ScriptedNetwork {
    pub script: Rc<RefCell<Script>>,
}

impl ScriptedNetwork {
    /// Queue an in-memory connection and return the server half.
    pub fn accept_next(&self) -> DuplexStream {
        let (client, server) = tokio::io::duplex(64 * 1024);
        self.script.borrow_mut().transports.push_back(client);
        server
    }
}

#[async_trait::async_trait(?Send)]
impl NetworkProvider for ScriptedNetwork {
    type Transport = DuplexStream;

    async fn resolve(&self, _host: &str, _port: u16) -> io::Result<Vec<SocketAddr>> {
        let (delay, resolution) = {
            let mut script = self.script.borrow_mut();
            script.resolve_calls += 1;
            (script.resolve_delay, script.resolution.clone())
        };

        tokio::time::sleep(delay).await;
        self.script.borrow_mut().resolves_completed += 1;

        match resolution {
            Resolution::Addrs(addrs) => Ok(addrs),
            Resolution::Fail => Err(io::Error::new(io::ErrorKind::NotFound, "no such host")),
        }
    }

    async fn connect(&self, addr: SocketAddr) -> io::Result<DuplexStream> {
        let delay = {
            let mut script = self.script.borrow_mut();
            script.connect_calls.push(addr);
            script.connect_delay
        };

        tokio::time::sleep(delay).await;

        let mut script = self.script.borrow_mut();
        script.connects_completed += 1;
        if script.refused.contains(&addr) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        script
            .transports
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "no listener"))
    }
}

/// Scripted network with real tokio time and local tasks.
#[derive(Clone, Default)]
pub struct TestProviders {
    pub network: ScriptedNetwork,
    time: TokioTimeProvider,
    task: TokioTaskProvider,
}

impl TestProviders {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Providers for TestProviders {
    type Network = ScriptedNetwork;
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

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn addr(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 11122))
}

pub fn endpoint() -> EndpointSpec {
    EndpointSpec::new("jet.test", 11122)
}

/// Encoded version announcement frame.
pub fn announcement(version: Version) -> Vec<u8> {
    encode_frame(MessageType::ApiVersion.as_u8(), &version.encode(), MAX_FRAME_SIZE)
        .expect("encode announcement")
}

pub fn supported_announcement() -> Vec<u8> {
    announcement(SUPPORTED_VERSION)
}
