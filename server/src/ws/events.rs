//! Typed payloads for every real-time event.
//!
//! Frames are JSON text: `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

/// Denormalized sender details attached to delivered messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSnippet {
    pub id: String,
    pub display_name: String,
}

/// A persisted chat message as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    /// Unix millis
    pub created_at: i64,
    pub sender: SenderSnippet,
}

/// An unpersisted message passed straight from one client to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedMessage {
    pub sender: SenderSnippet,
    pub recipient_identity_id: String,
    pub message: serde_json::Value,
}

/// Events the server emits to connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full set of identity ids with a live connection.
    OnlineUsers(Vec<String>),
    ReceiveMessage(MessageView),
    RelayedMessage(RelayedMessage),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::OnlineUsers(_) => "online_users",
            ServerEvent::ReceiveMessage(_) => "receive_message",
            ServerEvent::RelayedMessage(_) => "relayed_message",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub recipient_identity_id: String,
    pub message: serde_json::Value,
}

/// Events clients may emit over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Send(SendRequest),
}
