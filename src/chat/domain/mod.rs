//! Domain model for chat message storage.
//!
//! Pure types with no infrastructure dependencies: identifiers, the message
//! row and its draft, moderation state, and page cursors.

mod cursor;
mod error;
mod ids;
mod message;
mod moderation;

pub use cursor::PageCursor;
pub use error::ChatDomainError;
pub use ids::{MAX_IDENTIFIER_LENGTH, MessageId, SenderId, StreamId};
pub use message::{
    ChatMessage, ClusteringKey, MESSAGE_TTL_SECONDS, NewChatMessage, PersistedChatMessage,
    truncate_to_millis,
};
pub use moderation::{MessageType, MessageUpdate, ModerationStatus};
