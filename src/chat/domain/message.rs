//! The chat message row and the draft used to create one.
//!
//! A [`ChatMessage`] mirrors the persisted row: partition key, clustering key
//! and write-once payload columns, plus the mutable moderation status. A
//! [`NewChatMessage`] is the caller-facing draft whose optional fields are
//! filled in when the message is stamped for writing.

use super::ids::overlong;
use super::{
    ChatDomainError, MAX_IDENTIFIER_LENGTH, MessageId, MessageType, ModerationStatus, SenderId,
    StreamId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Retention applied to every row at insert time: 30 days.
pub const MESSAGE_TTL_SECONDS: u64 = 2_592_000;

/// Row identity within a partition.
///
/// Ordering is timestamp first, then message identifier. Partitions are
/// scanned in descending order of this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusteringKey {
    /// Primary clustering column.
    pub timestamp: DateTime<Utc>,
    /// Tiebreak for same-millisecond writes.
    pub message_id: MessageId,
}

/// A stored chat message.
///
/// # Invariants
///
/// - `(stream_id, timestamp, message_id)` never changes after insert
/// - `timestamp` carries millisecond precision
/// - only `moderation_status` is mutable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    stream_id: StreamId,
    timestamp: DateTime<Utc>,
    message_id: MessageId,
    sender_id: SenderId,
    sender_display_name: String,
    message_text: String,
    moderation_status: ModerationStatus,
    message_type: MessageType,
}

/// Parameter object for reconstructing a message read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedChatMessage {
    /// Partition key.
    pub stream_id: StreamId,
    /// Primary clustering column.
    pub timestamp: DateTime<Utc>,
    /// Secondary clustering column.
    pub message_id: MessageId,
    /// Author.
    pub sender_id: SenderId,
    /// Display name captured at write time.
    pub sender_display_name: String,
    /// Payload.
    pub message_text: String,
    /// Current visibility state.
    pub moderation_status: ModerationStatus,
    /// Content kind.
    pub message_type: MessageType,
}

impl ChatMessage {
    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedChatMessage) -> Self {
        Self {
            stream_id: data.stream_id,
            timestamp: data.timestamp,
            message_id: data.message_id,
            sender_id: data.sender_id,
            sender_display_name: data.sender_display_name,
            message_text: data.message_text,
            moderation_status: data.moderation_status,
            message_type: data.message_type,
        }
    }

    /// Returns the partition key.
    #[must_use]
    pub const fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// Returns the write timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    /// Returns the display name captured at write time.
    #[must_use]
    pub fn sender_display_name(&self) -> &str {
        &self.sender_display_name
    }

    /// Returns the payload.
    #[must_use]
    pub fn message_text(&self) -> &str {
        &self.message_text
    }

    /// Returns the current moderation status.
    #[must_use]
    pub const fn moderation_status(&self) -> ModerationStatus {
        self.moderation_status
    }

    /// Returns the content kind.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns the clustering key addressing this row within its partition.
    #[must_use]
    pub const fn clustering_key(&self) -> ClusteringKey {
        ClusteringKey {
            timestamp: self.timestamp,
            message_id: self.message_id,
        }
    }

    /// Returns a copy carrying a different moderation status.
    #[must_use]
    pub fn with_moderation_status(mut self, status: ModerationStatus) -> Self {
        self.moderation_status = status;
        self
    }
}

/// Draft message supplied by the caller of the write path.
///
/// # Examples
///
/// ```
/// use chatstore::chat::domain::{
///     MessageType, ModerationStatus, NewChatMessage, SenderId, StreamId,
/// };
/// use mockable::DefaultClock;
///
/// let draft = NewChatMessage::new(
///     StreamId::new("stream-1").expect("valid stream"),
///     SenderId::new("user-1").expect("valid sender"),
///     "hello chat",
/// )
/// .with_display_name("User One");
///
/// let message = draft.stamp(&DefaultClock).expect("defaults apply");
/// assert_eq!(message.moderation_status(), ModerationStatus::Visible);
/// assert_eq!(message.message_type(), MessageType::Text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    stream_id: StreamId,
    sender_id: SenderId,
    sender_display_name: String,
    message_text: String,
    timestamp: Option<DateTime<Utc>>,
    message_id: Option<MessageId>,
    moderation_status: Option<ModerationStatus>,
    message_type: Option<MessageType>,
}

impl NewChatMessage {
    /// Creates a draft with the required fields.
    #[must_use]
    pub fn new(stream_id: StreamId, sender_id: SenderId, message_text: impl Into<String>) -> Self {
        Self {
            stream_id,
            sender_id,
            sender_display_name: String::new(),
            message_text: message_text.into(),
            timestamp: None,
            message_id: None,
            moderation_status: None,
            message_type: None,
        }
    }

    /// Sets the denormalised display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.sender_display_name = display_name.into();
        self
    }

    /// Pins the write timestamp instead of reading the clock.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Pins the message identifier instead of generating one.
    #[must_use]
    pub const fn with_message_id(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Sets the initial moderation status.
    #[must_use]
    pub const fn with_moderation_status(mut self, status: ModerationStatus) -> Self {
        self.moderation_status = Some(status);
        self
    }

    /// Sets the content kind.
    #[must_use]
    pub const fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Returns the partition key.
    #[must_use]
    pub const fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    /// Returns the payload.
    #[must_use]
    pub fn message_text(&self) -> &str {
        &self.message_text
    }

    /// Applies write-time defaults and produces the row to persist.
    ///
    /// Unset timestamps read `clock`, unset identifiers are freshly
    /// generated, and unset status and type default to
    /// [`ModerationStatus::Visible`] and [`MessageType::Text`]. Timestamps
    /// are truncated to milliseconds, the storage precision.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::NilMessageId`] when a pinned identifier is
    /// the nil UUID, and [`ChatDomainError::DisplayNameTooLong`] when the
    /// display name exceeds [`MAX_IDENTIFIER_LENGTH`] characters.
    pub fn stamp(self, clock: &impl Clock) -> Result<ChatMessage, ChatDomainError> {
        if let Some(actual) = overlong(&self.sender_display_name) {
            return Err(ChatDomainError::DisplayNameTooLong {
                actual,
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
        let message_id = self.message_id.unwrap_or_default();
        if message_id.is_nil() {
            return Err(ChatDomainError::NilMessageId);
        }
        let timestamp = truncate_to_millis(self.timestamp.unwrap_or_else(|| clock.utc()));

        Ok(ChatMessage {
            stream_id: self.stream_id,
            timestamp,
            message_id,
            sender_id: self.sender_id,
            sender_display_name: self.sender_display_name,
            message_text: self.message_text,
            moderation_status: self.moderation_status.unwrap_or_default(),
            message_type: self.message_type.unwrap_or_default(),
        })
    }
}

/// Drops sub-millisecond precision from a timestamp.
#[must_use]
pub fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp.timestamp_millis()).unwrap_or(timestamp)
}
