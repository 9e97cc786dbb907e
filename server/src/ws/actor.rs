use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, timeout};

use crate::db::models::Identity;
use crate::state::AppState;
use crate::ws::lifecycle::{ConnectionLifecycle, LifecycleEvent};
use crate::ws::protocol;

/// How long the writer gets to flush a queued close frame after the reader stops.
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Run the actor-per-connection pattern for an authenticated WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Ping task: polices liveness and tells the reader when the peer went quiet
/// - Reader loop: processes incoming frames, dispatches client events
///
/// The connection is attached to the transport before it is registered so
/// that it receives the `online_users` broadcast its own registration causes.
pub async fn run_connection(
    socket: WebSocket,
    state: AppState,
    identity: Identity,
    mut lifecycle: ConnectionLifecycle,
) {
    let connection_id = lifecycle.connection_id().clone();
    let user_id = identity.id.clone();
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    state.transport.attach(connection_id.clone(), tx.clone());
    state.registry.register(connection_id.clone(), &user_id);
    lifecycle.record(LifecycleEvent::Registered);

    tracing::info!(
        user_id = %user_id,
        connection_id = %connection_id,
        "WebSocket actor started"
    );

    // Spawn writer task: forwards mpsc messages to WebSocket sink
    let mut writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    // Fires (or drops) when the ping task gives up on the peer
    let (dead_tx, mut dead_rx) = oneshot::channel::<()>();

    let ping_tx = tx.clone();
    let ping_interval = state.ws.ping_interval();
    let pong_timeout = state.ws.pong_timeout();
    let ping_user = user_id.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(ping_interval);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            // Unsolicited pongs do not answer the ping about to go out
            while pong_rx.try_recv().is_ok() {}

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer is gone, so is the connection
                break;
            }

            match timeout(pong_timeout, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    tracing::warn!(user_id = %ping_user, "Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }

        let _ = dead_tx.send(());
    });

    // Reader loop: runs until the peer leaves or the ping task declares it dead
    loop {
        let frame = tokio::select! {
            _ = &mut dead_rx => break,
            frame = ws_receiver.next() => frame,
        };

        match frame {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    protocol::handle_text_message(text.as_str(), &state, &identity);
                }
                Message::Binary(data) => {
                    // Events are JSON text; binary has no meaning here
                    tracing::debug!(
                        user_id = %user_id,
                        bytes = data.len(),
                        "Ignoring binary frame"
                    );
                }
                Message::Pong(_) => {
                    // Pong received, notify the ping task
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    // Respond to client pings with pong
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(
                        user_id = %user_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                // Stream ended, client disconnected
                tracing::info!(user_id = %user_id, "WebSocket stream ended");
                break;
            }
        }
    }

    ping_handle.abort();

    // Detach first so the closing socket is not sent its own departure.
    state.transport.detach(&connection_id);
    state.registry.unregister(&connection_id);
    lifecycle.record(LifecycleEvent::Disconnected);

    // With every sender dropped the writer drains what is queued and exits
    drop(tx);
    if timeout(WRITER_FLUSH_TIMEOUT, &mut writer_handle).await.is_err() {
        writer_handle.abort();
    }

    tracing::info!(
        user_id = %user_id,
        connection_id = %connection_id,
        phase = ?lifecycle.phase(),
        "WebSocket actor stopped"
    );
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            break;
        }
    }
}
