//! Client event dispatch.
//!
//! The only client event is the advisory `send` relay. It bypasses the
//! message store: nothing is persisted and nothing is acknowledged. The
//! REST `POST /api/messages` flow remains the system of record.

use thiserror::Error;

use crate::db::models::Identity;
use crate::state::AppState;
use crate::ws::events::{ClientEvent, RelayedMessage, SenderSnippet, SendRequest, ServerEvent};
use crate::ws::registry::ConnectionRegistry;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("malformed client event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("missing recipient")]
    MissingRecipient,
}

/// Handle an incoming text frame. Failures are logged and dropped so a bad
/// frame never affects the connection or the registry.
pub fn handle_text_message(text: &str, state: &AppState, sender: &Identity) {
    match dispatch(text, &state.registry, sender) {
        Ok(delivered) => {
            tracing::debug!(user_id = %sender.id, delivered, "Relayed client message");
        }
        Err(e) => {
            tracing::debug!(user_id = %sender.id, error = %e, "Discarded client frame");
        }
    }
}

/// Decode one client frame and act on it. Returns whether a relay reached
/// its recipient.
pub fn dispatch(
    text: &str,
    registry: &ConnectionRegistry,
    sender: &Identity,
) -> Result<bool, RelayError> {
    match serde_json::from_str::<ClientEvent>(text)? {
        ClientEvent::Send(request) => relay(registry, sender, request),
    }
}

fn relay(
    registry: &ConnectionRegistry,
    sender: &Identity,
    request: SendRequest,
) -> Result<bool, RelayError> {
    if request.recipient_identity_id.trim().is_empty() {
        return Err(RelayError::MissingRecipient);
    }

    let event = ServerEvent::RelayedMessage(RelayedMessage {
        sender: SenderSnippet {
            id: sender.id.clone(),
            display_name: sender.display_name.clone(),
        },
        recipient_identity_id: request.recipient_identity_id.clone(),
        message: request.message,
    });

    Ok(registry.deliver(&request.recipient_identity_id, &event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::transport::WsTransport;
    use crate::ws::ConnectionId;
    use axum::extract::ws::Message;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn alice() -> Identity {
        Identity {
            id: "alice".to_string(),
            display_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "user".to_string(),
        }
    }

    #[test]
    fn relay_attaches_sender_and_passes_message_verbatim() {
        let transport = Arc::new(WsTransport::new());
        let registry = ConnectionRegistry::new(transport.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.attach(ConnectionId::from("c-bob"), tx);
        registry.register(ConnectionId::from("c-bob"), "bob");
        // drain online_users broadcast
        let _ = rx.try_recv();

        let frame = json!({
            "event": "send",
            "data": {"recipient_identity_id": "bob", "message": {"text": "psst", "n": 1}}
        })
        .to_string();
        assert!(dispatch(&frame, &registry, &alice()).unwrap());

        let Message::Text(text) = rx.try_recv().unwrap() else {
            panic!("expected text frame");
        };
        let event: ServerEvent = serde_json::from_str(text.as_str()).unwrap();
        match event {
            ServerEvent::RelayedMessage(relayed) => {
                assert_eq!(relayed.sender.id, "alice");
                assert_eq!(relayed.sender.display_name, "Alice");
                assert_eq!(relayed.message, json!({"text": "psst", "n": 1}));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn relay_to_offline_recipient_is_not_delivered() {
        let registry = ConnectionRegistry::new(Arc::new(WsTransport::new()));
        let frame = r#"{"event":"send","data":{"recipient_identity_id":"ghost","message":"hi"}}"#;
        assert!(!dispatch(frame, &registry, &alice()).unwrap());
    }

    #[test]
    fn malformed_frames_are_errors() {
        let registry = ConnectionRegistry::new(Arc::new(WsTransport::new()));
        assert!(matches!(
            dispatch("{not json", &registry, &alice()),
            Err(RelayError::Malformed(_))
        ));
        let frame = r#"{"event":"send","data":{"recipient_identity_id":" ","message":"hi"}}"#;
        assert!(matches!(
            dispatch(frame, &registry, &alice()),
            Err(RelayError::MissingRecipient)
        ));
    }
}
