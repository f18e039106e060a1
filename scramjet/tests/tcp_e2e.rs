//! End-to-end sessions over real loopback TCP.

use std::time::Duration;

use scramjet::{
    ConnectError, ConnectionState, EndpointSpec, FrameReader, MAX_FRAME_SIZE, MessageType,
    PeerSession, SUPPORTED_VERSION, SessionConfig, SessionError, TokioProviders, encode_frame,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn config() -> SessionConfig {
    SessionConfig::default()
        .with_connect_timeout(Duration::from_secs(2))
        .with_handshake_timeout(Duration::from_secs(2))
}

/// Minimal jet peer: announce the version, then echo every frame back
/// with the type tag incremented.
async fn echo_peer(listener: TcpListener) {
    let (mut stream, _) = listener.accept().await.expect("accept");
    let announcement = encode_frame(
        MessageType::ApiVersion.as_u8(),
        &SUPPORTED_VERSION.encode(),
        MAX_FRAME_SIZE,
    )
    .expect("encode");
    stream.write_all(&announcement).await.expect("announce");

    let mut reader = FrameReader::new(MAX_FRAME_SIZE);
    while let Ok(frame) = reader.read_frame(&mut stream).await {
        let reply = encode_frame(frame.message_type() + 1, frame.body(), MAX_FRAME_SIZE)
            .expect("encode");
        if stream.write_all(&reply).await.is_err() {
            break;
        }
    }
}

#[tokio::test]
async fn test_tcp_handshake_and_echo() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let port = listener.local_addr().expect("local addr").port();
            let peer = tokio::task::spawn_local(echo_peer(listener));

            let mut session = PeerSession::new(
                TokioProviders::new(),
                EndpointSpec::new("127.0.0.1", port),
                config(),
            );
            session.connect().await.expect("connect");
            assert_eq!(session.state(), ConnectionState::Ready);
            assert_eq!(session.peer_version(), Some(SUPPORTED_VERSION));

            session.send(10, b"ping").expect("send");
            session.send(20, b"pong").expect("send");

            let first = session.receive().await.expect("first echo");
            assert_eq!((first.message_type(), first.body()), (11, &b"ping"[..]));
            let second = session.receive().await.expect("second echo");
            assert_eq!((second.message_type(), second.body()), (21, &b"pong"[..]));

            session.disconnect().await;
            assert_eq!(session.state(), ConnectionState::Closed);
            peer.await.expect("peer task");
        })
        .await;
}

#[tokio::test]
async fn test_tcp_connection_refused() {
    init_tracing();
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            // Grab a free port, then stop listening on it.
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let port = listener.local_addr().expect("local addr").port();
            drop(listener);

            let mut session = PeerSession::new(
                TokioProviders::new(),
                EndpointSpec::new("127.0.0.1", port),
                config(),
            );
            let result = session.connect().await;

            let expected = SessionError::Connect(ConnectError::ConnectionRefused);
            assert_eq!(result, Err(expected.clone()));
            assert_eq!(session.state(), ConnectionState::Failed(expected));
        })
        .await;
}
