//! In-memory implementation of the `ChatMessageStore` port.
//!
//! Models the wide-column layout directly: one ordered map per partition,
//! keyed by [`ClusteringKey`], with every row carrying the expiry computed
//! from the TTL at write time. Expired rows are skipped by reads and dropped
//! from a partition on its next write.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::chat::{
    domain::{ChatMessage, ClusteringKey, MessageId, ModerationStatus, SenderId, StreamId},
    ports::{ChatMessageStore, PartitionScan, StoreError, StoreResult, TimeWindow, WriteTtl},
};

/// Number of recent write statements retained for inspection.
pub const STATEMENT_LOG_CAPACITY: usize = 256;

/// A write statement observed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStatement {
    /// Number of rows carried by the statement.
    pub rows: usize,
    /// TTL attached to the statement.
    pub ttl: WriteTtl,
    /// `true` for a batch statement, `false` for a single insert.
    pub batched: bool,
}

#[derive(Debug, Clone)]
struct StoredRow {
    message: ChatMessage,
    expires_at: DateTime<Utc>,
}

impl StoredRow {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

type Partition = BTreeMap<ClusteringKey, StoredRow>;

#[derive(Debug, Default)]
struct StoreState {
    partitions: HashMap<StreamId, Partition>,
    statements: VecDeque<WriteStatement>,
}

impl StoreState {
    fn record(&mut self, statement: WriteStatement) {
        if self.statements.len() == STATEMENT_LOG_CAPACITY {
            self.statements.pop_front();
        }
        self.statements.push_back(statement);
    }
}

/// In-memory implementation of [`ChatMessageStore`].
///
/// Thread-safe via an internal [`RwLock`]. The injected clock drives TTL
/// expiry, which lets tests move time forward past the retention horizon.
///
/// # Example
///
/// ```
/// use chatstore::chat::adapters::memory::InMemoryChatMessageStore;
///
/// let store = InMemoryChatMessageStore::new();
/// assert!(store.is_empty());
/// ```
pub struct InMemoryChatMessageStore<C: Clock + Send + Sync = DefaultClock> {
    state: Arc<RwLock<StoreState>>,
    clock: Arc<C>,
}

impl InMemoryChatMessageStore<DefaultClock> {
    /// Creates an empty store driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryChatMessageStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Send + Sync> Clone for InMemoryChatMessageStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync> fmt::Debug for InMemoryChatMessageStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryChatMessageStore")
            .field("rows", &self.len())
            .finish_non_exhaustive()
    }
}

impl<C: Clock + Send + Sync> InMemoryChatMessageStore<C> {
    /// Creates an empty store driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            clock,
        }
    }

    /// Returns the number of live rows across all partitions.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.utc();
        self.state
            .read()
            .map(|guard| {
                guard
                    .partitions
                    .values()
                    .flat_map(BTreeMap::values)
                    .filter(|row| row.is_live(now))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns `true` if no live rows are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the most recent write statements, oldest first.
    ///
    /// At most [`STATEMENT_LOG_CAPACITY`] statements are kept; older ones
    /// are discarded. Returns an empty list if the internal lock is
    /// poisoned.
    #[must_use]
    pub fn write_statements(&self) -> Vec<WriteStatement> {
        self.state
            .read()
            .map(|guard| guard.statements.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the expiry of the row at `key`, live or not.
    ///
    /// Returns `None` if the row was never written or has been compacted.
    #[must_use]
    pub fn expiry_of(&self, stream_id: &StreamId, key: ClusteringKey) -> Option<DateTime<Utc>> {
        let guard = self.state.read().ok()?;
        guard
            .partitions
            .get(stream_id)
            .and_then(|partition| partition.get(&key))
            .map(|row| row.expires_at)
    }

    fn write_rows(&self, messages: &[ChatMessage], ttl: WriteTtl, batched: bool) -> StoreResult<()> {
        let now = self.clock.utc();
        let lifetime = TimeDelta::from_std(ttl.as_duration())
            .map_err(|err| StoreError::serialization(format!("invalid ttl: {err}")))?;
        let expires_at = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| StoreError::serialization("ttl overflows the timestamp range"))?;

        let mut guard = self.state.write().map_err(lock_poisoned)?;
        for message in messages {
            let partition = guard
                .partitions
                .entry(message.stream_id().clone())
                .or_default();
            partition.retain(|_, row| row.is_live(now));
            partition.insert(
                message.clustering_key(),
                StoredRow {
                    message: message.clone(),
                    expires_at,
                },
            );
        }
        guard.record(WriteStatement {
            rows: messages.len(),
            ttl,
            batched,
        });
        Ok(())
    }

    fn read_partition<T>(
        &self,
        stream_id: &StreamId,
        read: impl FnOnce(&mut dyn Iterator<Item = &ChatMessage>) -> T,
    ) -> StoreResult<T> {
        let now = self.clock.utc();
        let guard = self.state.read().map_err(lock_poisoned)?;
        let mut live = guard
            .partitions
            .get(stream_id)
            .into_iter()
            .flat_map(|partition| partition.values().rev())
            .filter(|row| row.is_live(now))
            .map(|row| &row.message);
        Ok(read(&mut live))
    }
}

fn lock_poisoned(err: impl fmt::Display) -> StoreError {
    StoreError::connection(format!("lock poisoned: {err}"))
}

fn saturating_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl<C: Clock + Send + Sync> ChatMessageStore for InMemoryChatMessageStore<C> {
    async fn insert(&self, message: &ChatMessage, ttl: WriteTtl) -> StoreResult<()> {
        self.write_rows(std::slice::from_ref(message), ttl, false)
    }

    async fn insert_batch(&self, messages: &[ChatMessage], ttl: WriteTtl) -> StoreResult<()> {
        self.write_rows(messages, ttl, true)
    }

    async fn find_in_partition(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
    ) -> StoreResult<Option<ChatMessage>> {
        self.read_partition(stream_id, |rows| {
            rows.filter(|message| message.message_id() == message_id)
                .cloned()
                .next()
        })
    }

    async fn scan_partition(&self, scan: &PartitionScan) -> StoreResult<Vec<ChatMessage>> {
        self.read_partition(&scan.stream_id, |rows| {
            rows.filter(|message| scan.cursor.admits(&message.clustering_key()))
                .filter(|message| {
                    scan.moderation_status
                        .is_none_or(|status| message.moderation_status() == status)
                })
                .take(scan.limit)
                .cloned()
                .collect()
        })
    }

    async fn update_moderation_status(
        &self,
        stream_id: &StreamId,
        key: ClusteringKey,
        status: ModerationStatus,
    ) -> StoreResult<()> {
        let now = self.clock.utc();
        let mut guard = self.state.write().map_err(lock_poisoned)?;
        let row = guard
            .partitions
            .get_mut(stream_id)
            .and_then(|partition| partition.get_mut(&key))
            .filter(|row| row.is_live(now))
            .ok_or_else(|| StoreError::RowMissing {
                stream_id: stream_id.clone(),
                message_id: key.message_id,
            })?;
        row.message = row.message.clone().with_moderation_status(status);
        Ok(())
    }

    async fn count_partition(&self, stream_id: &StreamId) -> StoreResult<u64> {
        self.read_partition(stream_id, |rows| saturating_count(rows.count()))
    }

    async fn count_sender_in_window(
        &self,
        stream_id: &StreamId,
        sender_id: &SenderId,
        window: TimeWindow,
    ) -> StoreResult<u64> {
        self.read_partition(stream_id, |rows| {
            saturating_count(
                rows.filter(|message| message.sender_id() == sender_id)
                    .filter(|message| window.contains(message.timestamp()))
                    .count(),
            )
        })
    }
}
