use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap},
    response::Response,
};
use serde::Deserialize;

use crate::db::models::Identity;
use crate::state::AppState;
use crate::ws::actor;
use crate::ws::handshake::{self, Handshake};
use crate::ws::lifecycle::{ConnectionLifecycle, LifecycleEvent};
use crate::ws::ConnectionId;

/// Query parameters for WebSocket connection.
/// The token is optional; the session cookie is the fallback.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// GET /ws?token=JWT
/// Authenticates before upgrading. On failure, upgrades then immediately
/// closes with 4001 (no credential) or 4002 (invalid credential).
/// On success, spawns an actor for the connection.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let mut lifecycle = ConnectionLifecycle::new(ConnectionId::generate());
    lifecycle.record(LifecycleEvent::HandshakeReceived);

    let handshake = Handshake {
        token: params.token,
        cookie_header: headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let keys = state.session_keys();
    let authenticated = handshake::authenticate(&state.db, &keys, &handshake).await;

    match authenticated {
        Ok(identity) => {
            lifecycle.record(LifecycleEvent::Authenticated);
            tracing::info!(
                user_id = %identity.id,
                connection_id = %lifecycle.connection_id(),
                "WebSocket connection authenticated"
            );
            ws.on_upgrade(move |socket| handle_authenticated(socket, state, identity, lifecycle))
        }
        Err(err) => {
            lifecycle.record(LifecycleEvent::AuthFailed);
            let close_code = err.close_code();
            let reason = err.to_string();

            tracing::warn!(
                connection_id = %lifecycle.connection_id(),
                close_code = close_code,
                reason = %reason,
                "WebSocket auth failed"
            );

            ws.on_upgrade(move |mut socket| async move {
                let close_frame = CloseFrame {
                    code: close_code,
                    reason: reason.into(),
                };
                let _ = socket.send(Message::Close(Some(close_frame))).await;
            })
        }
    }
}

async fn handle_authenticated(
    socket: WebSocket,
    state: AppState,
    identity: Identity,
    lifecycle: ConnectionLifecycle,
) {
    actor::run_connection(socket, state, identity, lifecycle).await;
}
