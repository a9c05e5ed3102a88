//! Interface to the lobby layer sitting above the transport.
//!
//! The gateway treats every frame payload as opaque text; interpretation
//! (join_lobby, gamelist, usernames) belongs to an implementation of
//! [`LobbyLayer`]. The canned payloads here are the fixed messages the
//! gateway itself emits during and right after the login exchange.

use crate::transport::session::SessionInfo;
use bytes::Bytes;

/// Version announcement sent to the client once the handshake completes.
pub const VERSION_MESSAGE: &str = "[version]\n[/version]";

/// Sent after the client announces its version.
pub const MUSTLOGIN_MESSAGE: &str = "[mustlogin]\n[/mustlogin]";

/// Lobby admission notice sent once the login frame arrives.
pub const JOIN_LOBBY_MESSAGE: &str =
    "[join_lobby]\nis_moderator=\"no\"\nprofile_url_prefix=\"\"\n[/join_lobby]";

/// Initial (empty) game list.
pub const GAMELIST_MESSAGE: &str = "[gamelist]\n[/gamelist]";

/// Consumer of decoded frame payloads.
///
/// Called from the session task; implementations must not block. Returned
/// frames are written back to the client in order.
pub trait LobbyLayer: Send + Sync + 'static {
    /// Frames to send immediately after a session reaches `LoggedIn`.
    fn on_logged_in(&self, session: &SessionInfo) -> Vec<Bytes>;

    /// Handles one decoded payload received after login.
    fn on_frame(&self, session: &SessionInfo, payload: Bytes) -> Vec<Bytes>;
}

/// Minimal lobby: greets a fresh login with the join_lobby and gamelist
/// payloads and drops everything else on the floor.
#[derive(Debug, Default)]
pub struct GreetingLobby;

impl LobbyLayer for GreetingLobby {
    fn on_logged_in(&self, _session: &SessionInfo) -> Vec<Bytes> {
        vec![
            Bytes::from_static(JOIN_LOBBY_MESSAGE.as_bytes()),
            Bytes::from_static(GAMELIST_MESSAGE.as_bytes()),
        ]
    }

    fn on_frame(&self, session: &SessionInfo, payload: Bytes) -> Vec<Bytes> {
        tracing::debug!(session = %session.id, bytes = payload.len(), "lobby payload ignored");
        Vec::new()
    }
}
