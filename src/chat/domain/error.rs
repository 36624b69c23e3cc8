//! Validation errors for chat message construction and mutation.

use thiserror::Error;

/// Errors returned while constructing or mutating chat message values.
///
/// Every variant is raised before any storage call is issued.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatDomainError {
    /// The stream identifier is empty after trimming.
    #[error("stream ID must not be empty")]
    EmptyStreamId,

    /// The sender identifier is empty after trimming.
    #[error("sender ID must not be empty")]
    EmptySenderId,

    /// The stream identifier is longer than the storage column allows.
    #[error("stream ID has {actual} characters, exceeds limit of {max}")]
    StreamIdTooLong {
        /// Number of characters in the rejected identifier.
        actual: usize,
        /// Permitted maximum.
        max: usize,
    },

    /// The sender identifier is longer than the storage column allows.
    #[error("sender ID has {actual} characters, exceeds limit of {max}")]
    SenderIdTooLong {
        /// Number of characters in the rejected identifier.
        actual: usize,
        /// Permitted maximum.
        max: usize,
    },

    /// The sender display name is longer than the storage column allows.
    #[error("sender display name has {actual} characters, exceeds limit of {max}")]
    DisplayNameTooLong {
        /// Number of characters in the rejected name.
        actual: usize,
        /// Permitted maximum.
        max: usize,
    },

    /// The message identifier is the nil UUID.
    #[error("message ID must not be nil")]
    NilMessageId,

    /// The message text exceeds the configured length.
    #[error("message text has {actual} characters, exceeds limit of {max}")]
    MessageTooLong {
        /// Number of characters in the rejected text.
        actual: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The moderation status is outside `visible`, `flagged`, `removed`.
    #[error("invalid moderation status '{0}', expected visible, flagged, or removed")]
    InvalidModerationStatus(String),

    /// The message type is not recognised.
    #[error("invalid message type '{0}', expected text, emote, or system")]
    InvalidMessageType(String),

    /// A batch create was requested with no messages.
    #[error("batch must contain at least one message")]
    EmptyBatch,

    /// An update named a field other than the moderation status.
    #[error("unsupported update field '{0}', only moderationStatus may be updated")]
    UnsupportedUpdateField(String),

    /// An update field carried a value of the wrong shape.
    #[error("invalid value for update field '{0}', expected a string")]
    InvalidUpdateValue(String),

    /// An update carried no fields.
    #[error("update must set moderationStatus")]
    EmptyUpdate,

    /// A rate-limit window cannot be represented as a time span.
    #[error("rate-limit window of {0} seconds is out of range")]
    InvalidRateWindow(u64),
}
