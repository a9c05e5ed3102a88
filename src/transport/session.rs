//! One accepted connection.
//!
//! A `Session` exclusively owns its socket and codec buffers and drives the
//! protocol state machine: probe, acknowledgment, login exchange, then frame
//! relay to the lobby layer. All reads and writes are awaited in order on the
//! session's task, so no two operations are ever in flight at once on the
//! same connection.

use crate::core::frame::FrameCodec;
use crate::error::{GatewayError, Result};
use crate::protocol::handshake::{HandshakeState, HANDSHAKE_ACK, PROBE_LEN};
use crate::protocol::lobby::{LobbyLayer, MUSTLOGIN_MESSAGE, VERSION_MESSAGE};
use crate::transport::admission::AdmissionGuard;
use crate::utils::compression::Compressor;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, stable session identifier. Monotonically assigned, so an id is
/// never reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity handed to the lobby layer alongside each payload.
#[derive(Debug, Clone, Copy)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer: IpAddr,
}

/// Server-side state for one live connection.
///
/// Created only after the admission check passes; the held guard keeps the
/// admission counters incremented and releases them when the session is
/// dropped, whatever the exit path.
pub struct Session {
    info: SessionInfo,
    state: HandshakeState,
    stream: TcpStream,
    buffer_capacity: usize,
    compressor: Compressor,
    _guard: AdmissionGuard,
}

impl Session {
    pub fn new(
        stream: TcpStream,
        guard: AdmissionGuard,
        buffer_capacity: usize,
        compressor: Compressor,
    ) -> Self {
        let info = SessionInfo {
            id: SessionId::next(),
            peer: guard.addr(),
        };
        info!(session = %info.id, peer = %info.peer, "connected");
        Self {
            info,
            state: HandshakeState::AwaitingProbe,
            stream,
            buffer_capacity,
            compressor,
            _guard: guard,
        }
    }

    pub fn info(&self) -> SessionInfo {
        self.info
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Runs the session to completion and logs the outcome.
    ///
    /// Peer resets and abrupt EOF are expected behavior and logged at debug;
    /// everything else that terminates the session is an error-level event.
    pub async fn serve(self, lobby: Arc<dyn LobbyLayer>) {
        let info = self.info;
        match self.run(lobby.as_ref()).await {
            Ok(()) => info!(session = %info.id, peer = %info.peer, "disconnected"),
            Err(e) if e.is_benign_disconnect() => {
                debug!(session = %info.id, peer = %info.peer, reason = %e, "peer disconnected")
            }
            Err(e) => {
                error!(session = %info.id, peer = %info.peer, error = %e, "session terminated")
            }
        }
    }

    /// Drives `AwaitingProbe → AwaitingLoginStart → LoggedIn`, then relays
    /// decoded payloads to the lobby layer until the peer goes away.
    async fn run(mut self, lobby: &dyn LobbyLayer) -> Result<()> {
        let mut probe = [0u8; PROBE_LEN];
        self.stream.read_exact(&mut probe).await?;

        self.state = match HandshakeState::apply_probe(probe) {
            Ok(next) => next,
            Err(e) => {
                // Rejected peers get nothing back, not even an error frame.
                self.state = HandshakeState::Rejected;
                return Err(e);
            }
        };
        self.stream.write_all(&HANDSHAKE_ACK).await?;
        debug!(session = %self.info.id, "handshake acknowledged");

        let codec = FrameCodec::new(self.buffer_capacity, self.compressor);
        let mut framed = Framed::new(self.stream, codec);

        // Login exchange: one version round trip, one must-login round trip.
        // Payload content stays opaque here.
        framed
            .send(Bytes::from_static(VERSION_MESSAGE.as_bytes()))
            .await?;
        let client_version = next_frame(&mut framed).await?;
        debug!(session = %self.info.id, bytes = client_version.len(), "client version received");

        framed
            .send(Bytes::from_static(MUSTLOGIN_MESSAGE.as_bytes()))
            .await?;
        let login = next_frame(&mut framed).await?;
        debug!(session = %self.info.id, bytes = login.len(), "login received");

        self.state = HandshakeState::LoggedIn;
        info!(session = %self.info.id, peer = %self.info.peer, "logged in");

        for frame in lobby.on_logged_in(&self.info) {
            framed.send(frame).await?;
        }

        while let Some(received) = framed.next().await {
            let payload = received?;
            debug!(session = %self.info.id, bytes = payload.len(), "frame received");
            for reply in lobby.on_frame(&self.info, payload) {
                framed.send(reply).await?;
            }
        }
        Ok(())
    }
}

/// A frame is required at this point in the exchange; clean EOF here is an
/// abrupt departure mid-login.
async fn next_frame(framed: &mut Framed<TcpStream, FrameCodec>) -> Result<Bytes> {
    match framed.next().await {
        Some(frame) => frame,
        None => Err(GatewayError::Io(io::ErrorKind::UnexpectedEof.into())),
    }
}
