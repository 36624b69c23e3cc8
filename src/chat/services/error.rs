//! Service-level errors for chat message operations.

use crate::chat::{
    domain::{ChatDomainError, MessageId, StreamId},
    ports::StoreError,
};
use thiserror::Error;

/// Coarse classification of a [`ChatStoreError`].
///
/// An outer API layer maps these onto its own status codes
/// (400, 404, 429, and 500 respectively for HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed.
    Validation,
    /// The addressed message does not exist or has expired.
    NotFound,
    /// The sender exceeded the write budget.
    RateLimited,
    /// The store failed or timed out.
    Storage,
}

/// Errors returned by [`super::ChatMessageService`].
#[derive(Debug, Error)]
pub enum ChatStoreError {
    /// Input failed validation before any storage call.
    #[error(transparent)]
    Validation(#[from] ChatDomainError),

    /// No live message with this identifier exists in the stream.
    #[error("chat message {message_id} not found in stream {stream_id}")]
    NotFound {
        /// Stream that was searched.
        stream_id: StreamId,
        /// Identifier that was looked up.
        message_id: MessageId,
    },

    /// A storage statement failed.
    #[error("failed to {operation}: {source}")]
    Storage {
        /// Human-readable operation label, e.g. `create chat message`.
        operation: &'static str,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A sub-batch failed after earlier sub-batches were committed.
    #[error(
        "failed to create chat message batch: messages {failed_start}..{failed_end} of {total} \
         failed after {committed} were committed: {source}"
    )]
    PartialBatch {
        /// Index of the first message in the failing sub-batch.
        failed_start: usize,
        /// Index one past the last message in the failing sub-batch.
        failed_end: usize,
        /// Messages committed by earlier sub-batches.
        committed: usize,
        /// Size of the whole request.
        total: usize,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The sender already wrote `count` messages inside the window.
    #[error("rate limit exceeded: {count} messages in {window_seconds}s (limit {limit})")]
    RateLimited {
        /// Messages counted inside the window.
        count: u64,
        /// Policy maximum.
        limit: u64,
        /// Window length in seconds.
        window_seconds: u64,
    },
}

impl ChatStoreError {
    pub(crate) const fn storage(operation: &'static str, source: StoreError) -> Self {
        Self::Storage { operation, source }
    }

    /// Returns the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Storage { .. } | Self::PartialBatch { .. } => ErrorKind::Storage,
        }
    }
}

/// Result type for chat message service operations.
pub type ChatStoreResult<T> = Result<T, ChatStoreError>;
