//! Capability handshake: the first four bytes a client sends select the
//! connection mode, and the server answers the normal mode with a fixed
//! magic acknowledgment.
//!
//! The TLS mode is recognized so it can be rejected cleanly, distinct from a
//! garbage probe. Neither rejection path writes anything back to the peer.

use crate::error::{GatewayError, Result};

/// Size of the capability probe and of the acknowledgment.
pub const PROBE_LEN: usize = 4;

/// Probe value requesting a normal, unencrypted connection.
pub const PROBE_NORMAL: [u8; PROBE_LEN] = [0x00, 0x00, 0x00, 0x00];

/// Probe value requesting a TLS connection. Recognized but rejected.
pub const PROBE_TLS: [u8; PROBE_LEN] = [0x00, 0x00, 0x00, 0x01];

/// Fixed acknowledgment sent after a normal-connection probe.
pub const HANDSHAKE_ACK: [u8; PROBE_LEN] = [0xDE, 0xAD, 0xBE, 0xEF];

/// What a 4-byte probe asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Normal,
    Tls,
    Malformed,
}

/// Classifies the capability probe.
pub fn classify_probe(probe: [u8; PROBE_LEN]) -> ProbeKind {
    match probe {
        PROBE_NORMAL => ProbeKind::Normal,
        PROBE_TLS => ProbeKind::Tls,
        _ => ProbeKind::Malformed,
    }
}

/// Per-session protocol state.
///
/// `AwaitingProbe → AwaitingLoginStart → LoggedIn`, or `Rejected` as the
/// terminal failure state. Transitions are driven by the session task; this
/// type only encodes the legal positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingProbe,
    AwaitingLoginStart,
    LoggedIn,
    Rejected,
}

impl HandshakeState {
    /// Resolves the probe into the follow-up state, or the error that
    /// terminates the session. Only meaningful in `AwaitingProbe`.
    pub fn apply_probe(probe: [u8; PROBE_LEN]) -> Result<HandshakeState> {
        match classify_probe(probe) {
            ProbeKind::Normal => Ok(HandshakeState::AwaitingLoginStart),
            ProbeKind::Tls => Err(GatewayError::TlsNotSupported),
            ProbeKind::Malformed => Err(GatewayError::MalformedHandshake(probe)),
        }
    }
}
