#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end protocol flow over real loopback connections: probe,
//! acknowledgment, login exchange, and the silent-close rejection paths.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use lobby_gateway::config::GatewayConfig;
use lobby_gateway::core::frame::FrameCodec;
use lobby_gateway::protocol::handshake::{HANDSHAKE_ACK, PROBE_NORMAL, PROBE_TLS};
use lobby_gateway::protocol::lobby::{
    GreetingLobby, GAMELIST_MESSAGE, JOIN_LOBBY_MESSAGE, MUSTLOGIN_MESSAGE, VERSION_MESSAGE,
};
use lobby_gateway::transport::{AdmissionController, Listener};
use lobby_gateway::utils::compression::{CompressionLevel, Compressor};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

const TEST_BUFFER_CAPACITY: usize = 4096;

/// Starts a gateway on an ephemeral loopback port. Dropping the returned
/// sender shuts the listener down.
async fn spawn_gateway(
    mutate: impl FnOnce(&mut GatewayConfig),
) -> (SocketAddr, Arc<AdmissionController>, mpsc::Sender<()>) {
    let mut config = GatewayConfig::default_with_overrides(|c| {
        c.server.bind_address = String::from("127.0.0.1");
        c.server.port = 0;
        c.limits.client_buffer_capacity = TEST_BUFFER_CAPACITY;
    });
    mutate(&mut config);

    let listener = Listener::bind(&config).await.expect("bind gateway");
    let addr = listener.local_addr().unwrap();
    let admission = listener.admission();

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(listener.serve_with_shutdown(Arc::new(GreetingLobby), shutdown_rx));

    (addr, admission, shutdown_tx)
}

fn client_codec() -> FrameCodec {
    FrameCodec::new(
        TEST_BUFFER_CAPACITY,
        Compressor::new(CompressionLevel::Default),
    )
}

/// Connects and completes the probe/ack exchange.
async fn connect_and_handshake(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(&PROBE_NORMAL).await.expect("send probe");

    let mut ack = [0u8; 4];
    stream.read_exact(&mut ack).await.expect("read ack");
    assert_eq!(ack, HANDSHAKE_ACK);
    stream
}

async fn wait_for_sessions(admission: &Arc<AdmissionController>, expected: usize) {
    for _ in 0..200 {
        if admission.active_total() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "session count never reached {expected}, still {}",
        admission.active_total()
    );
}

#[tokio::test]
async fn normal_probe_reaches_logged_in() {
    let (addr, admission, _shutdown) = spawn_gateway(|_| {}).await;

    let stream = connect_and_handshake(addr).await;
    let mut framed = Framed::new(stream, client_codec());

    // Server opens the login exchange with its version announcement.
    let version = framed.next().await.unwrap().unwrap();
    assert_eq!(version, Bytes::from_static(VERSION_MESSAGE.as_bytes()));

    framed
        .send(Bytes::from_static(b"[version]\n1.16.2\n[/version]"))
        .await
        .unwrap();

    let mustlogin = framed.next().await.unwrap().unwrap();
    assert_eq!(mustlogin, Bytes::from_static(MUSTLOGIN_MESSAGE.as_bytes()));

    framed
        .send(Bytes::from_static(b"[login]\nusername=\"alice\"\n[/login]"))
        .await
        .unwrap();

    // The lobby greeting is only sent once the session reaches LoggedIn.
    let join_lobby = framed.next().await.unwrap().unwrap();
    assert_eq!(join_lobby, Bytes::from_static(JOIN_LOBBY_MESSAGE.as_bytes()));

    let gamelist = framed.next().await.unwrap().unwrap();
    assert_eq!(gamelist, Bytes::from_static(GAMELIST_MESSAGE.as_bytes()));

    // Connection is still live and counted.
    assert_eq!(admission.active_total(), 1);

    drop(framed);
    wait_for_sessions(&admission, 0).await;
}

#[tokio::test]
async fn tls_probe_gets_no_ack_and_a_closed_connection() {
    let (addr, admission, _shutdown) = spawn_gateway(|_| {}).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&PROBE_TLS).await.unwrap();

    // No acknowledgment, no error frame: just EOF or a reset.
    let mut buf = [0u8; 4];
    match stream.read(&mut buf).await {
        Ok(0) | Err(_) => {}
        Ok(n) => panic!("rejected TLS probe received {n} bytes: {:02x?}", &buf[..n]),
    }

    wait_for_sessions(&admission, 0).await;
}

#[tokio::test]
async fn malformed_probe_gets_no_ack_and_a_closed_connection() {
    let (addr, admission, _shutdown) = spawn_gateway(|_| {}).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&[0x01, 0x02, 0x03, 0x04]).await.unwrap();

    let mut buf = [0u8; 4];
    match stream.read(&mut buf).await {
        Ok(0) | Err(_) => {}
        Ok(n) => panic!("malformed probe received {n} bytes: {:02x?}", &buf[..n]),
    }

    wait_for_sessions(&admission, 0).await;
}

#[tokio::test]
async fn oversized_frame_terminates_only_that_session() {
    let (addr, admission, _shutdown) = spawn_gateway(|c| {
        c.limits.client_buffer_capacity = 64;
    }).await;

    // A healthy session stays connected throughout.
    let healthy = connect_and_handshake(addr).await;
    wait_for_sessions(&admission, 1).await;

    // The offender claims a frame bigger than the configured capacity.
    let mut offender = TcpStream::connect(addr).await.unwrap();
    offender.write_all(&PROBE_NORMAL).await.unwrap();
    let mut ack = [0u8; 4];
    offender.read_exact(&mut ack).await.unwrap();
    offender
        .write_all(&(65_536u32).to_be_bytes())
        .await
        .unwrap();

    wait_for_sessions(&admission, 1).await;

    // The healthy session was untouched.
    drop(healthy);
    wait_for_sessions(&admission, 0).await;
}

#[tokio::test]
async fn corrupt_payload_terminates_the_session() {
    let (addr, admission, _shutdown) = spawn_gateway(|_| {}).await;

    let mut stream = connect_and_handshake(addr).await;
    wait_for_sessions(&admission, 1).await;

    // Well-formed length, garbage body.
    stream.write_all(&(4u32).to_be_bytes()).await.unwrap();
    stream.write_all(&[0xaa, 0xbb, 0xcc, 0xdd]).await.unwrap();

    wait_for_sessions(&admission, 0).await;
}
