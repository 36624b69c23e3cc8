//! Diesel row models for chat message persistence.

use super::schema::chat_messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for chat messages.
///
/// Expiry is only ever filtered on, so `expires_at` is not selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatMessageRow {
    /// Partition key.
    pub stream_id: String,
    /// Message timestamp.
    pub created_at: DateTime<Utc>,
    /// Message identifier.
    pub message_id: uuid::Uuid,
    /// Author identifier.
    pub sender_id: String,
    /// Display name captured at write time.
    pub sender_display_name: String,
    /// Message payload.
    pub message_text: String,
    /// Visibility state.
    pub moderation_status: String,
    /// Content kind.
    pub message_type: String,
}

/// Insert model for chat messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
pub struct NewChatMessageRow {
    /// Partition key.
    pub stream_id: String,
    /// Message timestamp.
    pub created_at: DateTime<Utc>,
    /// Message identifier.
    pub message_id: uuid::Uuid,
    /// Author identifier.
    pub sender_id: String,
    /// Display name captured at write time.
    pub sender_display_name: String,
    /// Message payload.
    pub message_text: String,
    /// Visibility state.
    pub moderation_status: String,
    /// Content kind.
    pub message_type: String,
    /// Expiry derived from the write TTL.
    pub expires_at: DateTime<Utc>,
}
