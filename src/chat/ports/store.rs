//! Storage port expressing the wide-column statements the engine issues.
//!
//! Every method is scoped to a single partition (`stream_id`). Implementations
//! provide partition-level ordering by [`ClusteringKey`] and honour the TTL
//! passed on each write: rows past their expiry are invisible to every read
//! and count.

use crate::chat::domain::{
    ChatMessage, ClusteringKey, MessageId, ModerationStatus, PageCursor, SenderId, StreamId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Time-to-live attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteTtl(Duration);

impl WriteTtl {
    /// Creates a TTL from whole seconds.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }

    /// Returns the TTL in whole seconds, the unit the store accepts.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0.as_secs()
    }

    /// Returns the TTL as a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

/// Bounded newest-first slice of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionScan {
    /// Partition to scan.
    pub stream_id: StreamId,
    /// Upper boundary of the slice.
    pub cursor: PageCursor,
    /// Maximum number of rows returned.
    pub limit: usize,
    /// Optional non-indexed filter on the moderation status.
    pub moderation_status: Option<ModerationStatus>,
}

/// Inclusive time range `[from, to]` over the primary clustering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Oldest admitted timestamp.
    pub from: DateTime<Utc>,
    /// Newest admitted timestamp.
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `true` when `timestamp` lies inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }
}

/// Port for partitioned chat message storage.
///
/// # Implementation Notes
///
/// - Inserts are upserts keyed by `(stream_id, timestamp, message_id)`:
///   resending an identical row yields one logical row.
/// - A batch is applied atomically by the store; callers bound its size.
/// - Status updates leave the row's expiry unchanged.
/// - No method retries; transport failures surface as [`StoreError`].
#[async_trait]
pub trait ChatMessageStore: Send + Sync {
    /// Inserts one row with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn insert(&self, message: &ChatMessage, ttl: WriteTtl) -> StoreResult<()>;

    /// Inserts a group of rows as one storage batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the batch fails; no row of the batch is
    /// applied in that case.
    async fn insert_batch(&self, messages: &[ChatMessage], ttl: WriteTtl) -> StoreResult<()>;

    /// Finds a live row in a partition by its secondary clustering column.
    ///
    /// This is a filtered partition scan, not a key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    async fn find_in_partition(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
    ) -> StoreResult<Option<ChatMessage>>;

    /// Returns live rows admitted by the scan's cursor and filter, newest
    /// first, at most `scan.limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    async fn scan_partition(&self, scan: &PartitionScan) -> StoreResult<Vec<ChatMessage>>;

    /// Sets the moderation status of the row at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowMissing`] when no live row exists at `key`,
    /// or another [`StoreError`] when the write fails.
    async fn update_moderation_status(
        &self,
        stream_id: &StreamId,
        key: ClusteringKey,
        status: ModerationStatus,
    ) -> StoreResult<()>;

    /// Counts every live row in a partition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count fails.
    async fn count_partition(&self, stream_id: &StreamId) -> StoreResult<u64>;

    /// Counts live rows written by `sender_id` with timestamps inside
    /// `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the count fails.
    async fn count_sender_in_window(
        &self,
        stream_id: &StreamId,
        sender_id: &SenderId,
        window: TimeWindow,
    ) -> StoreResult<u64>;
}

/// Errors returned by storage adapters.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),

    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// A stored row could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The statement did not complete within the configured timeout.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// No live row exists at the addressed clustering key.
    #[error("message {message_id} no longer exists in stream {stream_id}")]
    RowMissing {
        /// Partition addressed by the statement.
        stream_id: StreamId,
        /// Row addressed by the statement.
        message_id: MessageId,
    },
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
