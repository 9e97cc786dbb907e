//! REST endpoints for sending and retrieving chat messages.
//!
//! A message is persisted first; only then is a `receive_message` event
//! handed to the registry. Whether it reached a live connection does not
//! change the response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::Claims;
use crate::db::models::MessageWithSender;
use crate::db::{messages, users};
use crate::error::{ApiError, AuthError};
use crate::state::AppState;
use crate::ws::events::{MessageView, SenderSnippet, ServerEvent};

/// Maximum message text length (chars), after trimming.
const MAX_TEXT_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub text: String,
}

impl From<MessageWithSender> for MessageView {
    fn from(row: MessageWithSender) -> Self {
        let MessageWithSender {
            message,
            sender_display_name,
        } = row;
        MessageView {
            sender: SenderSnippet {
                id: message.sender_id.clone(),
                display_name: sender_display_name,
            },
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

/// Trim and bound message text.
pub fn validate_text(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Message text must not be empty"));
    }
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(ApiError::BadRequest("Message text too long"));
    }
    Ok(trimmed)
}

/// POST /api/messages - Persist a message, then notify the receiver if online.
pub async fn send_message(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let text = validate_text(&body.text)?.to_string();
    let receiver_id = body.receiver_id;

    let db = state.db.clone();
    let sender_id = claims.sub.clone();
    let receiver = receiver_id.clone();

    let view: MessageView = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| ApiError::Internal(format!("DB lock error: {}", e)))?;

        let sender = users::find_identity(&conn, &sender_id)?
            .ok_or(ApiError::Unauthorized(AuthError::AuthenticationInvalid))?;
        if users::find_identity(&conn, &receiver)?.is_none() {
            return Err(ApiError::NotFound("Receiver"));
        }

        let message = messages::insert_message(&conn, &sender.id, &receiver, &text)?;
        Ok::<MessageView, ApiError>(
            MessageWithSender {
                message,
                sender_display_name: sender.display_name,
            }
            .into(),
        )
    })
    .await??;

    let delivered = state
        .registry
        .deliver(&receiver_id, &ServerEvent::ReceiveMessage(view.clone()));

    tracing::debug!(
        message_id = %view.id,
        user_id = %view.sender_id,
        receiver_id = %receiver_id,
        delivered,
        "Message persisted"
    );

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/messages/{other_id} - Conversation with another identity,
/// oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    claims: Claims,
    Path(other_id): Path<String>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let db = state.db.clone();
    let user_id = claims.sub;

    let history = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| ApiError::Internal(format!("DB lock error: {}", e)))?;
        let rows = messages::history_between(&conn, &user_id, &other_id)?;
        Ok::<Vec<MessageView>, ApiError>(rows.into_iter().map(MessageView::from).collect())
    })
    .await??;

    Ok(Json(history))
}
