pub mod actor;
pub mod events;
pub mod handler;
pub mod handshake;
pub mod lifecycle;
pub mod protocol;
pub mod registry;
pub mod transport;

use std::fmt;
use tokio::sync::mpsc;

/// Sender half of a WebSocket connection's outbound channel.
/// The transport clones this to push frames to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Transport-assigned id of one live WebSocket session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Fresh id, unique for the lifetime of the process.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
