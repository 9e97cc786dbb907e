use axum::extract::ws::Message;
use dashmap::DashMap;

use super::events::ServerEvent;
use super::{ConnectionId, ConnectionSender};

/// Where the registry emits events. The WebSocket implementation is
/// [`WsTransport`]; tests substitute a recorder.
pub trait Transport: Send + Sync {
    /// Emit to one connection. Returns false if the connection is not
    /// attached or its channel has closed.
    fn emit_to(&self, connection: &ConnectionId, event: &ServerEvent) -> bool;

    /// Emit to every attached connection.
    fn emit_all(&self, event: &ServerEvent);
}

/// Outbound channels of all open, authenticated WebSocket connections.
#[derive(Default)]
pub struct WsTransport {
    senders: DashMap<ConnectionId, ConnectionSender>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, connection: ConnectionId, sender: ConnectionSender) {
        self.senders.insert(connection, sender);
    }

    pub fn detach(&self, connection: &ConnectionId) {
        self.senders.remove(connection);
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

fn encode(event: &ServerEvent) -> Option<Message> {
    match event.to_json() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::warn!(event = event.name(), error = %e, "Failed to encode event");
            None
        }
    }
}

impl Transport for WsTransport {
    fn emit_to(&self, connection: &ConnectionId, event: &ServerEvent) -> bool {
        let Some(sender) = self.senders.get(connection) else {
            return false;
        };
        match encode(event) {
            Some(msg) => sender.send(msg).is_ok(),
            None => false,
        }
    }

    fn emit_all(&self, event: &ServerEvent) {
        let Some(msg) = encode(event) else {
            return;
        };
        for entry in self.senders.iter() {
            let _ = entry.value().send(msg.clone());
        }
    }
}
