//! Diesel schema for the chat message partition table.

diesel::table! {
    /// Chat message rows, partitioned by stream and clustered by
    /// `(created_at, message_id)`.
    chat_messages (stream_id, created_at, message_id) {
        /// Partition key.
        #[max_length = 255]
        stream_id -> Varchar,
        /// Primary clustering column (the message timestamp).
        created_at -> Timestamptz,
        /// Secondary clustering column.
        message_id -> Uuid,
        /// Author identifier.
        #[max_length = 255]
        sender_id -> Varchar,
        /// Display name captured at write time.
        #[max_length = 255]
        sender_display_name -> Varchar,
        /// Message payload.
        message_text -> Text,
        /// Visibility state.
        #[max_length = 16]
        moderation_status -> Varchar,
        /// Content kind.
        #[max_length = 16]
        message_type -> Varchar,
        /// Write time plus TTL; rows at or past this instant are expired.
        expires_at -> Timestamptz,
    }
}
