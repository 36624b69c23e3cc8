//! Moderation state, content kinds, and the update request accepted by the
//! moderation mutator.

use super::ChatDomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Visibility state of a stored message.
///
/// No transition graph is enforced: any status may replace any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Shown to every reader.
    #[default]
    Visible,
    /// Held for moderator review.
    Flagged,
    /// Soft-deleted; the row remains until its TTL elapses.
    Removed,
}

impl ModerationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Flagged => "flagged",
            Self::Removed => "removed",
        }
    }
}

impl TryFrom<&str> for ModerationStatus {
    type Error = ChatDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "visible" => Ok(Self::Visible),
            "flagged" => Ok(Self::Flagged),
            "removed" => Ok(Self::Removed),
            _ => Err(ChatDomainError::InvalidModerationStatus(value.to_owned())),
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content carried by a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Plain chat text.
    #[default]
    Text,
    /// Third-person action line (`/me waves`).
    Emote,
    /// Message generated by the platform rather than a participant.
    System,
}

impl MessageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Emote => "emote",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for MessageType {
    type Error = ChatDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(Self::Text),
            "emote" => Ok(Self::Emote),
            "system" => Ok(Self::System),
            _ => Err(ChatDomainError::InvalidMessageType(value.to_owned())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MODERATION_STATUS_FIELDS: [&str; 2] = ["moderationStatus", "moderation_status"];

/// Field changes accepted by the moderation mutator.
///
/// Only the moderation status is mutable; every other column is write-once.
///
/// # Examples
///
/// ```
/// use chatstore::chat::domain::{MessageUpdate, ModerationStatus};
/// use serde_json::json;
///
/// let fields = json!({ "moderationStatus": "flagged" });
/// let update = MessageUpdate::from_fields(fields.as_object().expect("object"))
///     .expect("valid update");
/// assert_eq!(update.moderation_status(), ModerationStatus::Flagged);
///
/// let archived = json!({ "moderationStatus": "archived" });
/// assert!(MessageUpdate::from_fields(archived.as_object().expect("object")).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageUpdate {
    moderation_status: ModerationStatus,
}

impl MessageUpdate {
    /// Creates an update that sets the moderation status.
    #[must_use]
    pub const fn set_moderation_status(moderation_status: ModerationStatus) -> Self {
        Self { moderation_status }
    }

    /// Parses an update from loosely-typed request fields.
    ///
    /// Accepts `moderationStatus` (or `moderation_status`) as the only key.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::EmptyUpdate`] when no fields are present,
    /// [`ChatDomainError::UnsupportedUpdateField`] for any other key,
    /// [`ChatDomainError::InvalidUpdateValue`] when the status is not a
    /// string, and [`ChatDomainError::InvalidModerationStatus`] when the
    /// string is outside the enumerated set.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ChatDomainError> {
        let mut moderation_status = None;
        for (field, value) in fields {
            if !MODERATION_STATUS_FIELDS.contains(&field.as_str()) {
                return Err(ChatDomainError::UnsupportedUpdateField(field.clone()));
            }
            let raw = value
                .as_str()
                .ok_or_else(|| ChatDomainError::InvalidUpdateValue(field.clone()))?;
            moderation_status = Some(ModerationStatus::try_from(raw)?);
        }

        moderation_status
            .map(Self::set_moderation_status)
            .ok_or(ChatDomainError::EmptyUpdate)
    }

    /// Returns the requested moderation status.
    #[must_use]
    pub const fn moderation_status(self) -> ModerationStatus {
        self.moderation_status
    }
}
