//! Write path, read path, moderation mutator and rate limiter for chat
//! messages.

use super::error::{ChatStoreError, ChatStoreResult};
use crate::chat::{
    domain::{
        ChatDomainError, ChatMessage, MESSAGE_TTL_SECONDS, MessageId, MessageUpdate,
        ModerationStatus, NewChatMessage, PageCursor, SenderId, StreamId,
    },
    ports::{ChatMessageStore, PartitionScan, StoreError, StoreResult, TimeWindow, WriteTtl},
};
use crate::config::EngineConfig;
use chrono::TimeDelta;
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const CREATE_OPERATION: &str = "create chat message";
const GET_OPERATION: &str = "get chat message";
const LIST_OPERATION: &str = "list chat messages";
const LIST_BY_MODERATION_OPERATION: &str = "list chat messages by moderation status";
const UPDATE_OPERATION: &str = "update chat message";
const COUNT_OPERATION: &str = "count chat messages";
const RATE_LIMIT_OPERATION: &str = "check chat rate limit";

/// Chat message storage service.
///
/// Every storage statement issued by the service is bounded by
/// [`EngineConfig::statement_timeout`]; none is retried.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use chatstore::chat::{
///     adapters::memory::InMemoryChatMessageStore,
///     domain::{NewChatMessage, SenderId, StreamId},
///     services::ChatMessageService,
/// };
/// use mockable::DefaultClock;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ChatMessageService::new(
///     Arc::new(InMemoryChatMessageStore::new()),
///     Arc::new(DefaultClock),
/// );
/// let stream = StreamId::new("stream-1")?;
/// let created = service
///     .create(NewChatMessage::new(stream.clone(), SenderId::new("user-1")?, "hello"))
///     .await?;
///
/// let page = service.list_by_stream(&stream, None, None).await?;
/// assert_eq!(page.first().map(|message| message.message_id()), Some(created.message_id()));
/// # Ok(())
/// # }
/// ```
pub struct ChatMessageService<S, C>
where
    S: ChatMessageStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    config: EngineConfig,
}

impl<S, C> Clone for ChatMessageService<S, C>
where
    S: ChatMessageStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S, C> ChatMessageService<S, C>
where
    S: ChatMessageStore,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default engine configuration.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_config(store, clock, EngineConfig::default())
    }

    /// Creates a service with an explicit engine configuration.
    #[must_use]
    pub const fn with_config(store: Arc<S>, clock: Arc<C>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the engine configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Persists one message with the 30-day retention TTL.
    ///
    /// Unset fields are defaulted before the write, and the stored row is
    /// returned. The insert is an upsert: resubmitting a message with the
    /// same timestamp and identifier leaves one row.
    ///
    /// The caller is expected to have consulted the rate limiter; see
    /// [`Self::create_rate_limited`] for the combined form.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Validation`] when the text or display name
    /// is too long or a pinned identifier is nil, and
    /// [`ChatStoreError::Storage`] when the insert fails or times out.
    #[tracing::instrument(
        skip_all,
        fields(stream_id = %draft.stream_id(), sender_id = %draft.sender_id())
    )]
    pub async fn create(&self, draft: NewChatMessage) -> ChatStoreResult<ChatMessage> {
        let message = self.prepare(draft)?;
        self.bounded(self.store.insert(&message, Self::ttl()))
            .await
            .map_err(|source| ChatStoreError::storage(CREATE_OPERATION, source))?;
        debug!(message_id = %message.message_id(), "chat message created");
        Ok(message)
    }

    /// Checks the configured rate-limit policy, then creates the message.
    ///
    /// The check and the write are separate statements, so concurrent
    /// writers from the same sender can each pass the check.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::RateLimited`] when the sender has reached
    /// the policy maximum, or any error [`Self::create`] and
    /// [`Self::rate_limit_check`] return.
    #[tracing::instrument(
        skip_all,
        fields(stream_id = %draft.stream_id(), sender_id = %draft.sender_id())
    )]
    pub async fn create_rate_limited(&self, draft: NewChatMessage) -> ChatStoreResult<ChatMessage> {
        let policy = self.config.rate_limit;
        let count = self
            .rate_limit_check(draft.stream_id(), draft.sender_id(), policy.window_seconds)
            .await?;
        if !policy.permits(count) {
            warn!(
                count,
                limit = policy.max_messages,
                window_seconds = policy.window_seconds,
                "chat message rejected by rate limit"
            );
            return Err(ChatStoreError::RateLimited {
                count,
                limit: policy.max_messages,
                window_seconds: policy.window_seconds,
            });
        }
        self.create(draft).await
    }

    /// Persists many messages in sequential sub-batches.
    ///
    /// Every message is defaulted and validated before the first write.
    /// Sub-batches hold at most [`EngineConfig::sub_batch_size`] messages and
    /// are not atomic with respect to each other: when one fails, earlier
    /// sub-batches stay committed and later ones are never sent.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Validation`] for an empty request or an
    /// invalid message, and [`ChatStoreError::PartialBatch`] naming the
    /// failing range when a sub-batch fails or times out.
    #[tracing::instrument(skip_all, fields(total = drafts.len()))]
    pub async fn batch_create(
        &self,
        drafts: Vec<NewChatMessage>,
    ) -> ChatStoreResult<Vec<ChatMessage>> {
        if drafts.is_empty() {
            return Err(ChatDomainError::EmptyBatch.into());
        }
        let messages = drafts
            .into_iter()
            .map(|draft| self.prepare(draft))
            .collect::<Result<Vec<_>, _>>()?;

        let total = messages.len();
        let ttl = Self::ttl();
        let mut committed = 0;
        for chunk in messages.chunks(self.config.sub_batch_size()) {
            if let Err(source) = self.bounded(self.store.insert_batch(chunk, ttl)).await {
                warn!(committed, total, error = %source, "chat message sub-batch failed");
                return Err(ChatStoreError::PartialBatch {
                    failed_start: committed,
                    failed_end: committed + chunk.len(),
                    committed,
                    total,
                    source,
                });
            }
            committed += chunk.len();
            debug!(committed, total, "chat message sub-batch committed");
        }
        Ok(messages)
    }

    /// Retrieves a message by identifier within its stream.
    ///
    /// This is a filtered partition scan meant for moderation review, not a
    /// hot path.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::NotFound`] when no live message matches,
    /// and [`ChatStoreError::Storage`] when the scan fails.
    #[tracing::instrument(skip_all, fields(stream_id = %stream_id, message_id = %message_id))]
    pub async fn get_by_id(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
    ) -> ChatStoreResult<ChatMessage> {
        self.find(stream_id, message_id, GET_OPERATION).await
    }

    /// Returns one page of a stream, newest first.
    ///
    /// `limit` of `None` or `0` selects the default page size and larger
    /// values are clamped to the ceiling. Without a cursor the page starts
    /// at the current time. For the next page pass
    /// `PageCursor::before(last.timestamp())`, or `PageCursor::after(&last)`
    /// to keep same-millisecond neighbours of the last item.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Storage`] when the scan fails.
    #[tracing::instrument(skip_all, fields(stream_id = %stream_id))]
    pub async fn list_by_stream(
        &self,
        stream_id: &StreamId,
        limit: Option<u32>,
        cursor: Option<PageCursor>,
    ) -> ChatStoreResult<Vec<ChatMessage>> {
        let scan = self.scan(stream_id, limit, cursor, None);
        self.bounded(self.store.scan_partition(&scan))
            .await
            .map_err(|source| ChatStoreError::storage(LIST_OPERATION, source))
    }

    /// Returns one page of a stream restricted to a moderation status.
    ///
    /// Same ordering, limits, and cursors as [`Self::list_by_stream`]. The
    /// status column is not indexed, so the store filters the partition
    /// scan; reserve this for moderator tooling.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Storage`] when the scan fails.
    #[tracing::instrument(skip_all, fields(stream_id = %stream_id, status = %status))]
    pub async fn get_by_moderation(
        &self,
        stream_id: &StreamId,
        status: ModerationStatus,
        limit: Option<u32>,
        cursor: Option<PageCursor>,
    ) -> ChatStoreResult<Vec<ChatMessage>> {
        let scan = self.scan(stream_id, limit, cursor, Some(status));
        self.bounded(self.store.scan_partition(&scan))
            .await
            .map_err(|source| ChatStoreError::storage(LIST_BY_MODERATION_OPERATION, source))
    }

    /// Applies a moderation update and returns the updated message.
    ///
    /// Two statements are issued: a read recovering the message timestamp,
    /// then an update keyed by `(stream_id, timestamp, message_id)`. The
    /// pair is not atomic; concurrent updates resolve last-write-wins. A
    /// message that expires between the read and the write reports
    /// not-found.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::NotFound`] when no live message matches,
    /// and [`ChatStoreError::Storage`] when either statement fails.
    #[tracing::instrument(
        skip_all,
        fields(stream_id = %stream_id, message_id = %message_id)
    )]
    pub async fn update(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
        update: MessageUpdate,
    ) -> ChatStoreResult<ChatMessage> {
        let existing = self.find(stream_id, message_id, UPDATE_OPERATION).await?;
        let status = update.moderation_status();
        self.bounded(self.store.update_moderation_status(
            stream_id,
            existing.clustering_key(),
            status,
        ))
        .await
        .map_err(|source| match source {
            StoreError::RowMissing { .. } => ChatStoreError::NotFound {
                stream_id: stream_id.clone(),
                message_id,
            },
            other => ChatStoreError::storage(UPDATE_OPERATION, other),
        })?;
        info!(
            from = %existing.moderation_status(),
            to = %status,
            "chat message moderation status changed"
        );
        Ok(existing.with_moderation_status(status))
    }

    /// Parses loosely-typed update fields, then applies them as
    /// [`Self::update`] does.
    ///
    /// Field validation happens before any storage statement.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Validation`] for unknown keys, non-string
    /// values, unrecognised statuses, or an empty map, and otherwise any
    /// error [`Self::update`] returns.
    pub async fn update_fields(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> ChatStoreResult<ChatMessage> {
        let update = MessageUpdate::from_fields(fields)?;
        self.update(stream_id, message_id, update).await
    }

    /// Soft-deletes a message by marking it removed.
    ///
    /// The row stays in storage until its TTL elapses.
    ///
    /// # Errors
    ///
    /// Returns any error [`Self::update`] returns.
    pub async fn delete(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
    ) -> ChatStoreResult<ChatMessage> {
        self.update(
            stream_id,
            message_id,
            MessageUpdate::set_moderation_status(ModerationStatus::Removed),
        )
        .await
    }

    /// Counts every live message in a stream.
    ///
    /// Scans the whole partition; avoid on hot paths.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Storage`] when the count fails.
    #[tracing::instrument(skip_all, fields(stream_id = %stream_id))]
    pub async fn count_by_stream(&self, stream_id: &StreamId) -> ChatStoreResult<u64> {
        let count = self
            .bounded(self.store.count_partition(stream_id))
            .await
            .map_err(|source| ChatStoreError::storage(COUNT_OPERATION, source))?;
        debug!(count, "full partition count");
        Ok(count)
    }

    /// Counts the sender's messages in a stream written during the last
    /// `window_seconds` seconds, both ends inclusive.
    ///
    /// The count is a soft signal: it may already be stale when the caller
    /// acts on it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatStoreError::Validation`] when the window cannot be
    /// represented, and [`ChatStoreError::Storage`] when the count fails.
    #[tracing::instrument(skip_all, fields(stream_id = %stream_id, sender_id = %sender_id))]
    pub async fn rate_limit_check(
        &self,
        stream_id: &StreamId,
        sender_id: &SenderId,
        window_seconds: u64,
    ) -> ChatStoreResult<u64> {
        let span = i64::try_from(window_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or(ChatDomainError::InvalidRateWindow(window_seconds))?;
        let now = self.clock.utc();
        let from = now
            .checked_sub_signed(span)
            .ok_or(ChatDomainError::InvalidRateWindow(window_seconds))?;
        let window = TimeWindow { from, to: now };

        self.bounded(self.store.count_sender_in_window(stream_id, sender_id, window))
            .await
            .map_err(|source| ChatStoreError::storage(RATE_LIMIT_OPERATION, source))
    }

    fn prepare(&self, draft: NewChatMessage) -> Result<ChatMessage, ChatDomainError> {
        let length = draft.message_text().chars().count();
        if length > self.config.max_text_length {
            return Err(ChatDomainError::MessageTooLong {
                actual: length,
                max: self.config.max_text_length,
            });
        }
        draft.stamp(&*self.clock)
    }

    fn scan(
        &self,
        stream_id: &StreamId,
        limit: Option<u32>,
        cursor: Option<PageCursor>,
        moderation_status: Option<ModerationStatus>,
    ) -> PartitionScan {
        PartitionScan {
            stream_id: stream_id.clone(),
            cursor: cursor.unwrap_or_else(|| PageCursor::latest(self.clock.utc())),
            limit: self.config.page_limit(limit),
            moderation_status,
        }
    }

    async fn find(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
        operation: &'static str,
    ) -> ChatStoreResult<ChatMessage> {
        self.bounded(self.store.find_in_partition(stream_id, message_id))
            .await
            .map_err(|source| ChatStoreError::storage(operation, source))?
            .ok_or_else(|| ChatStoreError::NotFound {
                stream_id: stream_id.clone(),
                message_id,
            })
    }

    const fn ttl() -> WriteTtl {
        WriteTtl::from_secs(MESSAGE_TTL_SECONDS)
    }

    async fn bounded<T>(&self, statement: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        let limit = self.config.statement_timeout();
        tokio::time::timeout(limit, statement)
            .await
            .map_err(|_elapsed| StoreError::Timeout(limit))?
    }
}
