//! Persisted chat message log.
//! Messages are append-only; history between a pair is ordered by
//! created_at ascending, ties broken by id (UUIDv7, so insertion order).

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::models::{ChatMessageRow, MessageWithSender};

/// Append a message. `text` is stored as given; callers validate it first.
pub fn insert_message(
    conn: &Connection,
    sender_id: &str,
    receiver_id: &str,
    text: &str,
) -> rusqlite::Result<ChatMessageRow> {
    let row = ChatMessageRow {
        id: Uuid::now_v7().to_string(),
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        text: text.to_string(),
        created_at: Utc::now().timestamp_millis(),
    };

    conn.execute(
        "INSERT INTO messages (id, sender_id, receiver_id, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            row.id,
            row.sender_id,
            row.receiver_id,
            row.text,
            row.created_at
        ],
    )?;

    Ok(row)
}

/// All messages exchanged between two identities, in either direction.
pub fn history_between(
    conn: &Connection,
    a: &str,
    b: &str,
) -> rusqlite::Result<Vec<MessageWithSender>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.sender_id, m.receiver_id, m.text, m.created_at, u.display_name
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
            OR (m.sender_id = ?2 AND m.receiver_id = ?1)
         ORDER BY m.created_at ASC, m.id ASC",
    )?;

    let rows = stmt.query_map(params![a, b], |row| {
        Ok(MessageWithSender {
            message: ChatMessageRow {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                receiver_id: row.get(2)?,
                text: row.get(3)?,
                created_at: row.get(4)?,
            },
            sender_display_name: row.get(5)?,
        })
    })?;

    rows.collect()
}
