//! Database row types.
//! These correspond to the SQLite schema defined in migrations.rs.

use serde::{Deserialize, Serialize};

/// Role column values.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A user or admin record with its secret fields left out.
/// This is the only shape of a user the real-time layer ever reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
}

/// Fields needed to insert a user row.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub display_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

/// Chat message row in the messages table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    /// Unix millis
    pub created_at: i64,
}

/// A message row joined with its sender's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithSender {
    pub message: ChatMessageRow,
    pub sender_display_name: String,
}
