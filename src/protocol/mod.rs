//! # Protocol Layer
//!
//! The connection-level protocol above raw TCP and below the lobby:
//! capability handshake and the seam to the lobby layer.
//!
//! ## Components
//! - **Handshake**: 4-byte probe classification, fixed acknowledgment,
//!   per-session state machine positions
//! - **Lobby**: the `LobbyLayer` trait plus the canned login-exchange payloads

pub mod handshake;
pub mod lobby;
