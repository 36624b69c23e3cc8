//! Identifier newtypes for streams, senders, and messages.
//!
//! Stream and sender identifiers are opaque caller-supplied strings that must
//! be non-empty and at most [`MAX_IDENTIFIER_LENGTH`] characters. Message
//! identifiers wrap UUIDs so that concurrent writers can
//! mint them without coordination.

use super::ChatDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Longest stream identifier, sender identifier, or display name accepted,
/// in characters. Matches the `VARCHAR(255)` storage columns.
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Partition key identifying a conversation or channel.
///
/// # Examples
///
/// ```
/// use chatstore::chat::domain::StreamId;
///
/// let stream = StreamId::new("  live-42 ").expect("valid stream");
/// assert_eq!(stream.as_str(), "live-42");
/// assert!(StreamId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Creates a validated stream identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::EmptyStreamId`] when the value is empty
    /// after trimming, and [`ChatDomainError::StreamIdTooLong`] when it
    /// exceeds [`MAX_IDENTIFIER_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ChatDomainError> {
        let normalised = normalise(value.into()).ok_or(ChatDomainError::EmptyStreamId)?;
        if let Some(actual) = overlong(&normalised) {
            return Err(ChatDomainError::StreamIdTooLong {
                actual,
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
        Ok(Self(normalised))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the message author, used for rate-limit accounting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    /// Creates a validated sender identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::EmptySenderId`] when the value is empty
    /// after trimming, and [`ChatDomainError::SenderIdTooLong`] when it
    /// exceeds [`MAX_IDENTIFIER_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ChatDomainError> {
        let normalised = normalise(value.into()).ok_or(ChatDomainError::EmptySenderId)?;
        if let Some(actual) = overlong(&normalised) {
            return Err(ChatDomainError::SenderIdTooLong {
                actual,
                max: MAX_IDENTIFIER_LENGTH,
            });
        }
        Ok(Self(normalised))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SenderId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalise(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == raw.len() {
        return Some(raw);
    }
    Some(trimmed.to_owned())
}

/// Returns the character count of `value` when it exceeds
/// [`MAX_IDENTIFIER_LENGTH`].
pub(super) fn overlong(value: &str) -> Option<usize> {
    let length = value.chars().count();
    (length > MAX_IDENTIFIER_LENGTH).then_some(length)
}

/// Secondary clustering key disambiguating same-timestamp writes.
///
/// # Examples
///
/// ```
/// use chatstore::chat::domain::MessageId;
///
/// let id = MessageId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Returns `true` when the identifier is the nil UUID.
    #[must_use]
    pub const fn is_nil(self) -> bool {
        self.0.is_nil()
    }
}

/// Generates a fresh random identifier on each call.
impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for MessageId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
