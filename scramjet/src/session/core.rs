//! Peer session: connect, version handshake, then steady-state framing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use scramjet_core::{EndpointSpec, Providers, TaskProvider, TimeProvider};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;

use super::config::SessionConfig;
use super::handshake::verify_version_announcement;
use super::metrics::SessionMetrics;
use super::state::ConnectionState;
use crate::connector::{AbortSignal, ConnectError, Connector, Deadline, TransportOf};
use crate::error::{SessionError, SessionResult};
use crate::version::Version;
use crate::wire::{Frame, FrameReader, FramingError, encode_frame};

/// Type alias for the session's message-received channel.
/// Used when taking ownership via `take_receiver()`.
pub type SessionReceiver = mpsc::UnboundedReceiver<Result<Frame, FramingError>>;

/// State shared between the session, its disconnect handles and the
/// connection task.
struct SessionShared {
    /// Lifecycle state, observable through `subscribe_state()`
    state_tx: watch::Sender<ConnectionState>,

    /// Abort signal of the current attempt; replaced on every `connect()`
    abort: AbortSignal,

    /// Encoded frames waiting for the connection task
    send_queue: VecDeque<Vec<u8>>,

    /// Metrics collection
    metrics: SessionMetrics,

    /// Version the peer announced, once `Ready`
    peer_version: Option<Version>,
}

impl SessionShared {
    fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }
}

fn transition(shared: &RefCell<SessionShared>, next: ConnectionState) {
    let shared = shared.borrow();
    let previous = shared.state_tx.send_replace(next.clone());
    tracing::debug!("session: {} -> {}", previous, next);
}

/// A client session with one remote jet peer.
///
/// Drives a [`Connector`] to open a transport, requires the peer's first
/// frame to be an acceptable version announcement, and then hands every
/// following frame to the message-received channel. Nothing reaches that
/// channel before the handshake succeeds.
///
/// Once `Ready`, a background connection task owns the transport and its
/// [`FrameReader`] exclusively; the session talks to it through a send
/// queue, a `Notify` and the attempt's [`AbortSignal`].
///
/// Must be used from within a [`tokio::task::LocalSet`].
pub struct PeerSession<P: Providers> {
    /// Providers bundle for connecting and spawning the connection task
    providers: P,

    /// Remote endpoint
    endpoint: EndpointSpec,

    /// Configuration (owned by the session)
    config: SessionConfig,

    /// Shared state accessible to the connection task
    shared: Rc<RefCell<SessionShared>>,

    /// Trigger to wake the connection task when frames are queued
    data_to_send: Rc<Notify>,

    /// Connection task of the current attempt, once `Ready`
    connection_handle: Option<JoinHandle<()>>,

    /// Receive channel of the current attempt.
    /// Can be taken via `take_receiver()` for external ownership.
    receive_rx: Option<SessionReceiver>,

    receiver_taken: bool,
}

impl<P: Providers> PeerSession<P> {
    /// Create an idle session. Nothing happens until [`connect`](Self::connect).
    pub fn new(providers: P, endpoint: EndpointSpec, config: SessionConfig) -> Self {
        let now = providers.time().now();
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Idle);

        let shared = SessionShared {
            state_tx,
            abort: AbortSignal::new(),
            send_queue: VecDeque::new(),
            metrics: SessionMetrics::new_at(now),
            peer_version: None,
        };

        Self {
            providers,
            endpoint,
            config,
            shared: Rc::new(RefCell::new(shared)),
            data_to_send: Rc::new(Notify::new()),
            connection_handle: None,
            receive_rx: None,
            receiver_taken: false,
        }
    }

    /// Remote endpoint.
    pub fn endpoint(&self) -> &EndpointSpec {
        &self.endpoint
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.borrow().state()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.borrow().state_tx.subscribe()
    }

    /// Version the peer announced, while the attempt that verified it lasts.
    pub fn peer_version(&self) -> Option<Version> {
        self.shared.borrow().peer_version
    }

    /// Snapshot of the session metrics.
    pub fn metrics(&self) -> SessionMetrics {
        self.shared.borrow().metrics.clone()
    }

    /// A cloneable handle that can disconnect this session from elsewhere,
    /// including while `connect()` is in flight.
    pub fn disconnect_handle(&self) -> DisconnectHandle {
        DisconnectHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Resolve, connect and complete the version handshake.
    ///
    /// Returns `Ok(())` only once the session is `Ready`. Allowed from
    /// `Idle` and from the terminal states; each call is a fresh attempt
    /// with its own deadline, abort signal and receive channel.
    ///
    /// # Errors
    ///
    /// - `Connect(Timeout | HostNotFound | ConnectionRefused)` -> `Failed`
    /// - `Connect(OperationAborted)` after a disconnect -> `Closed`
    /// - `Version(..)`, `Framing(..)`, `HandshakeTimeout` -> `Failed`, with
    ///   the transport closed first
    /// - `InvalidOperation` if an attempt is already running or `Ready`
    pub async fn connect(&mut self) -> SessionResult<()> {
        let current = self.state();
        if !current.can_connect() {
            return Err(SessionError::InvalidOperation(format!(
                "connect() while {}",
                current
            )));
        }

        // A previous connection task has already exited in a terminal state.
        self.connection_handle = None;

        let abort = AbortSignal::new();
        let (receive_tx, receive_rx) = mpsc::unbounded_channel();
        {
            let mut shared = self.shared.borrow_mut();
            shared.abort = abort.clone();
            shared.send_queue.clear();
            shared.peer_version = None;
            shared.metrics.record_connect_attempt();
        }
        self.receive_rx = Some(receive_rx);
        self.receiver_taken = false;

        tracing::debug!("session: connecting to {}", self.endpoint);
        let (stream, reader, version) = match self.open(&abort).await {
            Ok(opened) => opened,
            Err(e) => {
                let now = self.providers.time().now();
                if e == SessionError::Connect(ConnectError::OperationAborted) {
                    tracing::debug!("session: connect to {} aborted", self.endpoint);
                    transition(&self.shared, ConnectionState::Closed);
                } else {
                    tracing::warn!("session: connect to {} failed: {}", self.endpoint, e);
                    self.shared
                        .borrow_mut()
                        .metrics
                        .record_connect_failure_at(now);
                    transition(&self.shared, ConnectionState::Failed(e.clone()));
                }
                return Err(e);
            }
        };

        {
            let now = self.providers.time().now();
            let mut shared = self.shared.borrow_mut();
            shared.peer_version = Some(version);
            shared.metrics.record_handshake_at(now);
        }
        transition(&self.shared, ConnectionState::Ready);
        tracing::debug!(
            "session: {} ready, peer version {}",
            self.endpoint,
            version
        );

        let handle = self.providers.task().spawn_task(
            "connection_task",
            connection_task::<P>(
                self.shared.clone(),
                self.providers.time().clone(),
                self.data_to_send.clone(),
                stream,
                reader,
                receive_tx,
                abort,
            ),
        );
        self.connection_handle = Some(handle);

        Ok(())
    }

    /// Run the connect phases and the handshake for one attempt.
    async fn open(
        &self,
        abort: &AbortSignal,
    ) -> SessionResult<(TransportOf<P>, FrameReader, Version)> {
        let connector =
            Connector::new(self.providers.clone()).with_phase_budget(self.config.phase_budget);
        let deadline = Deadline::start(self.providers.time().clone(), self.config.connect_timeout);

        transition(&self.shared, ConnectionState::Resolving);
        let addrs = connector.resolve(&self.endpoint, &deadline, abort).await?;

        transition(&self.shared, ConnectionState::Connecting);
        let deadline = deadline.next_phase(self.config.phase_budget);
        let mut stream = connector.establish(&addrs, &deadline, abort).await?;

        transition(&self.shared, ConnectionState::AwaitingVersion);
        let mut reader = FrameReader::new(self.config.max_frame_size);
        match self.await_version(&mut stream, &mut reader, abort).await {
            Ok(version) => Ok((stream, reader, version)),
            Err(e) => {
                close_transport(&mut stream).await;
                Err(e)
            }
        }
    }

    /// Read the first frame and run it through the version gate.
    async fn await_version(
        &self,
        stream: &mut TransportOf<P>,
        reader: &mut FrameReader,
        abort: &AbortSignal,
    ) -> SessionResult<Version> {
        let time = self.providers.time().clone();
        let handshake_timeout = self.config.handshake_timeout;

        let first = tokio::select! {
            biased;

            _ = abort.aborted() => {
                return Err(ConnectError::OperationAborted.into());
            }

            result = time.timeout(handshake_timeout, reader.read_frame(stream)) => {
                match result {
                    Ok(frame) => frame?,
                    Err(_) => return Err(SessionError::HandshakeTimeout(handshake_timeout)),
                }
            }
        };

        match verify_version_announcement(&first, &self.config.required_version) {
            Ok(version) => Ok(version),
            Err(e) => {
                tracing::warn!("session: rejecting {}: {}", self.endpoint, e);
                Err(e.into())
            }
        }
    }

    /// Queue one frame for the connection task.
    ///
    /// # Errors
    ///
    /// `NotConnected` unless `Ready`; `Framing(FrameTooLarge)` if the frame
    /// exceeds the configured maximum.
    pub fn send(&self, message_type: u8, body: &[u8]) -> SessionResult<()> {
        if !self.state().is_ready() {
            return Err(SessionError::NotConnected);
        }

        let data = encode_frame(message_type, body, self.config.max_frame_size)?;
        self.shared.borrow_mut().send_queue.push_back(data);
        self.data_to_send.notify_one();
        Ok(())
    }

    /// Wait for the next received frame.
    ///
    /// # Errors
    ///
    /// - `Framing(..)` for the read error that ended the connection
    /// - `Disconnected` once the connection task has exited
    /// - `ReceiverTaken` if `take_receiver()` was called
    /// - `NotConnected` before the first `connect()`
    pub async fn receive(&mut self) -> SessionResult<Frame> {
        let rx = self.receiver()?;
        match rx.recv().await {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(e)) => Err(e.into()),
            None => Err(SessionError::Disconnected),
        }
    }

    /// Non-blocking [`receive`](Self::receive). `Ok(None)` if nothing is
    /// pending yet.
    pub fn try_receive(&mut self) -> SessionResult<Option<Frame>> {
        let rx = self.receiver()?;
        match rx.try_recv() {
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(e)) => Err(e.into()),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SessionError::Disconnected),
        }
    }

    /// Take ownership of the current attempt's receive channel.
    pub fn take_receiver(&mut self) -> Option<SessionReceiver> {
        let rx = self.receive_rx.take();
        if rx.is_some() {
            self.receiver_taken = true;
        }
        rx
    }

    fn receiver(&mut self) -> SessionResult<&mut SessionReceiver> {
        match self.receive_rx.as_mut() {
            Some(rx) => Ok(rx),
            None if self.receiver_taken => Err(SessionError::ReceiverTaken),
            None => Err(SessionError::NotConnected),
        }
    }

    /// Close the session and wait for the transport to be released.
    ///
    /// No-op on a session that is already `Closed` or `Failed`.
    pub async fn disconnect(&mut self) {
        self.disconnect_handle().disconnect();
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.await;
        }
    }
}

impl<P: Providers> Drop for PeerSession<P> {
    fn drop(&mut self) {
        self.shared.borrow().abort.abort();
    }
}

/// Disconnects a [`PeerSession`] without holding it mutably.
///
/// An in-flight `connect()` settles as `Connect(OperationAborted)` and the
/// session moves to `Closed`; a `Ready` session closes its transport.
#[derive(Clone)]
pub struct DisconnectHandle {
    shared: Weak<RefCell<SessionShared>>,
}

impl DisconnectHandle {
    /// Request the disconnect. Returns `false` if there was nothing to do.
    pub fn disconnect(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };

        let (state, abort) = {
            let shared = shared.borrow();
            (shared.state(), shared.abort.clone())
        };

        match state {
            ConnectionState::Closed | ConnectionState::Failed(_) => {
                tracing::debug!("session: disconnect on {} session ignored", state);
                false
            }
            ConnectionState::Idle => {
                transition(&shared, ConnectionState::Closed);
                true
            }
            state if state.is_connecting() => {
                tracing::debug!("session: aborting connect while {}", state);
                abort.abort()
            }
            _ => abort.abort(),
        }
    }
}

impl std::fmt::Debug for DisconnectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisconnectHandle").finish_non_exhaustive()
    }
}

async fn close_transport<S>(stream: &mut S)
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.shutdown().await {
        tracing::debug!("session: transport shutdown failed: {}", e);
    }
}

/// Background task owning the transport once the session is `Ready`.
///
/// - Stops on the attempt's abort signal, closing the transport -> `Closed`
/// - Writes queued frames from a branch of its own, so neither an abort nor
///   an inbound frame waits behind a peer that stops reading
/// - Forwards every inbound frame to the receive channel in wire order
/// - On a read or write error: closes the transport, moves to `Failed`,
///   then reports the error on the channel
async fn connection_task<P: Providers>(
    shared: Rc<RefCell<SessionShared>>,
    time: P::Time,
    data_to_send: Rc<Notify>,
    stream: TransportOf<P>,
    mut reader: FrameReader,
    receive_tx: mpsc::UnboundedSender<Result<Frame, FramingError>>,
    abort: AbortSignal,
) {
    let (mut read_half, mut write_half) = tokio::io::split(stream);

    // Frame being written and how much of it the transport has taken.
    let mut outbound: Vec<u8> = Vec::new();
    let mut written = 0;
    let mut needs_flush = false;

    loop {
        if written == outbound.len() {
            // No RefCell borrow held across an await.
            let next = shared.borrow_mut().send_queue.pop_front();
            outbound = next.unwrap_or_default();
            written = 0;
        }
        let writing = written < outbound.len();

        tokio::select! {
            biased;

            _ = abort.aborted() => {
                tracing::debug!("connection_task: disconnect requested");
                if writing {
                    tracing::debug!(
                        "connection_task: dropping partially written frame ({}/{} bytes)",
                        written,
                        outbound.len()
                    );
                }
                close_transport(&mut write_half).await;
                shared.borrow_mut().send_queue.clear();
                transition(&shared, ConnectionState::Closed);
                break;
            }

            result = write_step(&mut write_half, &outbound[written..]), if writing || needs_flush => {
                let result = match result {
                    Ok(0) if writing => Err("transport accepted no bytes".to_string()),
                    Ok(n) => Ok(n),
                    Err(e) => Err(e.to_string()),
                };
                match result {
                    Ok(n) if writing => {
                        written += n;
                        if written == outbound.len() {
                            shared.borrow_mut().metrics.record_frame_sent(outbound.len());
                            needs_flush = true;
                        }
                    }
                    Ok(_) => needs_flush = false,
                    Err(reason) => {
                        let e = FramingError::WriteFailed { reason };
                        tracing::warn!("connection_task: write failed: {}", e);
                        fail(&shared, time.now(), &mut write_half, &receive_tx, e).await;
                        break;
                    }
                }
            }

            _ = data_to_send.notified(), if !writing => {}

            result = reader.read_frame(&mut read_half) => {
                match result {
                    Ok(frame) => {
                        tracing::trace!(
                            "connection_task: frame type={} len={}",
                            frame.message_type(),
                            frame.len()
                        );
                        shared.borrow_mut().metrics.record_frame_received(frame.len());
                        if receive_tx.send(Ok(frame)).is_err() {
                            tracing::debug!("connection_task: receiver dropped, frame discarded");
                        }
                    }
                    Err(e) => {
                        tracing::warn!("connection_task: read failed: {}", e);
                        fail(&shared, time.now(), &mut write_half, &receive_tx, e).await;
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("connection_task: exiting");
}

/// One step of outbound progress: a single write of `pending`, or a flush
/// once nothing is pending. Cancel-safe; nothing is lost if dropped.
async fn write_step<W>(sink: &mut W, pending: &[u8]) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    if pending.is_empty() {
        sink.flush().await.map(|()| 0)
    } else {
        sink.write(pending).await
    }
}

async fn fail<S>(
    shared: &Rc<RefCell<SessionShared>>,
    now: Duration,
    stream: &mut S,
    receive_tx: &mpsc::UnboundedSender<Result<Frame, FramingError>>,
    error: FramingError,
) where
    S: AsyncWrite + Unpin,
{
    close_transport(stream).await;
    {
        let mut shared = shared.borrow_mut();
        shared.send_queue.clear();
        shared.metrics.record_failure_at(now);
    }
    transition(shared, ConnectionState::Failed(error.clone().into()));
    let _ = receive_tx.send(Err(error));
}
