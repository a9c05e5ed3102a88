//! # lobby-gateway
//!
//! Connection gateway core for a turn-based multiplayer lobby protocol.
//!
//! The gateway terminates client TCP connections, performs a fixed-size
//! capability handshake, drives a login exchange, and moves every logical
//! message through a length-prefixed, gzip-compressed framing layer. What
//! the messages *mean* is left to a [`protocol::lobby::LobbyLayer`]
//! implementation; the gateway only guarantees byte-exact framing, strictly
//! ordered per-connection I/O, and hard bounds on attacker-controlled sizes.
//!
//! ## Layers
//! - [`core`] — frame codec: `[u32 BE length][compressed payload]`
//! - [`protocol`] — capability handshake and the lobby seam
//! - [`transport`] — listener, admission control, per-connection sessions
//! - [`utils`] — compression adapter, logging setup
//!
//! ## Quick Start
//! ```no_run
//! use lobby_gateway::config::GatewayConfig;
//! use lobby_gateway::protocol::lobby::GreetingLobby;
//! use lobby_gateway::transport::Listener;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> lobby_gateway::Result<()> {
//!     let config = GatewayConfig::default();
//!     let listener = Listener::bind(&config).await?;
//!     listener.serve(Arc::new(GreetingLobby)).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use config::GatewayConfig;
pub use error::{GatewayError, RejectReason, Result};
pub use transport::{Listener, SessionId, SessionInfo};
pub use utils::{CompressionLevel, Compressor};
