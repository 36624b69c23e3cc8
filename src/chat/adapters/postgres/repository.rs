//! `PostgreSQL` implementation of the chat message partition table.
//!
//! The table's primary key is `(stream_id, created_at, message_id)`, the same
//! partition and clustering layout a wide-column store would use. Write TTLs
//! become an `expires_at` column that every read filters on; the
//! [`PostgresChatMessageStore::purge_expired`] sweep stands in for the
//! store's own compaction.

use super::{
    models::{ChatMessageRow, NewChatMessageRow},
    schema::chat_messages,
};
use crate::chat::{
    domain::{
        ChatMessage, ClusteringKey, MessageId, MessageType, ModerationStatus, PageCursor,
        PersistedChatMessage, SenderId, StreamId,
    },
    ports::{ChatMessageStore, PartitionScan, StoreError, StoreResult, TimeWindow, WriteTtl},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by the chat store.
pub type ChatPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed chat message store.
///
/// # Example
///
/// ```ignore
/// use diesel::r2d2::{ConnectionManager, Pool};
/// use diesel::PgConnection;
/// use chatstore::chat::adapters::postgres::PostgresChatMessageStore;
///
/// let manager = ConnectionManager::<PgConnection>::new("postgres://...");
/// let pool = Pool::builder().build(manager).expect("pool");
/// let store = PostgresChatMessageStore::new(pool);
/// ```
#[derive(Debug)]
pub struct PostgresChatMessageStore<C: Clock + Send + Sync = DefaultClock> {
    pool: ChatPgPool,
    clock: Arc<C>,
}

impl PostgresChatMessageStore<DefaultClock> {
    /// Creates a store from a connection pool, using the system clock for
    /// expiry.
    #[must_use]
    pub fn new(pool: ChatPgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C: Clock + Send + Sync> Clone for PostgresChatMessageStore<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync + 'static> PostgresChatMessageStore<C> {
    /// Creates a store from a connection pool and an expiry clock.
    #[must_use]
    pub const fn with_clock(pool: ChatPgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &ChatPgPool {
        &self.pool
    }

    /// Deletes every expired row and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    pub async fn purge_expired(&self) -> StoreResult<u64> {
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let removed =
                diesel::delete(chat_messages::table.filter(chat_messages::expires_at.le(now)))
                    .execute(connection)?;
            Ok(saturating_count(removed))
        })
        .await
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| StoreError::connection(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }

    fn expiry_for(&self, ttl: WriteTtl) -> StoreResult<DateTime<Utc>> {
        let lifetime = TimeDelta::from_std(ttl.as_duration())
            .map_err(|err| StoreError::serialization(format!("invalid ttl: {err}")))?;
        self.clock
            .utc()
            .checked_add_signed(lifetime)
            .ok_or_else(|| StoreError::serialization("ttl overflows the timestamp range"))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync + 'static> ChatMessageStore for PostgresChatMessageStore<C> {
    async fn insert(&self, message: &ChatMessage, ttl: WriteTtl) -> StoreResult<()> {
        let row = to_new_row(message, self.expiry_for(ttl)?);
        self.run_blocking(move |connection| upsert_rows(connection, std::slice::from_ref(&row)))
            .await
    }

    async fn insert_batch(&self, messages: &[ChatMessage], ttl: WriteTtl) -> StoreResult<()> {
        let expires_at = self.expiry_for(ttl)?;
        let rows: Vec<NewChatMessageRow> = messages
            .iter()
            .map(|message| to_new_row(message, expires_at))
            .collect();
        self.run_blocking(move |connection| {
            connection.transaction::<_, StoreError, _>(|tx| upsert_rows(tx, &rows))
        })
        .await
    }

    async fn find_in_partition(
        &self,
        stream_id: &StreamId,
        message_id: MessageId,
    ) -> StoreResult<Option<ChatMessage>> {
        let stream = stream_id.as_str().to_owned();
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let row = chat_messages::table
                .filter(chat_messages::stream_id.eq(stream))
                .filter(chat_messages::message_id.eq(message_id.into_inner()))
                .filter(chat_messages::expires_at.gt(now))
                .select(ChatMessageRow::as_select())
                .first::<ChatMessageRow>(connection)
                .optional()?;
            row.map(row_to_message).transpose()
        })
        .await
    }

    async fn scan_partition(&self, scan: &PartitionScan) -> StoreResult<Vec<ChatMessage>> {
        let stream = scan.stream_id.as_str().to_owned();
        let cursor = scan.cursor;
        let status = scan.moderation_status;
        let limit = i64::try_from(scan.limit).map_err(StoreError::persistence)?;
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let mut query: chat_messages::BoxedQuery<'_, Pg, _> = chat_messages::table
                .select(ChatMessageRow::as_select())
                .filter(chat_messages::stream_id.eq(stream))
                .filter(chat_messages::expires_at.gt(now))
                .into_boxed();

            query = match cursor {
                PageCursor::Latest(instant) => query.filter(chat_messages::created_at.le(instant)),
                PageCursor::Before(instant) => query.filter(chat_messages::created_at.lt(instant)),
                PageCursor::After(ClusteringKey {
                    timestamp,
                    message_id,
                }) => query.filter(
                    chat_messages::created_at.lt(timestamp).or(chat_messages::created_at
                        .eq(timestamp)
                        .and(chat_messages::message_id.lt(message_id.into_inner()))),
                ),
            };
            if let Some(moderation_status) = status {
                query = query.filter(chat_messages::moderation_status.eq(moderation_status.as_str()));
            }

            let rows = query
                .order((
                    chat_messages::created_at.desc(),
                    chat_messages::message_id.desc(),
                ))
                .limit(limit)
                .load::<ChatMessageRow>(connection)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }

    async fn update_moderation_status(
        &self,
        stream_id: &StreamId,
        key: ClusteringKey,
        status: ModerationStatus,
    ) -> StoreResult<()> {
        let owned_stream_id = stream_id.clone();
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let target = chat_messages::table
                .filter(chat_messages::stream_id.eq(owned_stream_id.as_str()))
                .filter(chat_messages::created_at.eq(key.timestamp))
                .filter(chat_messages::message_id.eq(key.message_id.into_inner()))
                .filter(chat_messages::expires_at.gt(now));
            let updated = diesel::update(target)
                .set(chat_messages::moderation_status.eq(status.as_str()))
                .execute(connection)?;
            if updated == 0 {
                return Err(StoreError::RowMissing {
                    stream_id: owned_stream_id,
                    message_id: key.message_id,
                });
            }
            Ok(())
        })
        .await
    }

    async fn count_partition(&self, stream_id: &StreamId) -> StoreResult<u64> {
        let stream = stream_id.as_str().to_owned();
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let count: i64 = chat_messages::table
                .filter(chat_messages::stream_id.eq(stream))
                .filter(chat_messages::expires_at.gt(now))
                .count()
                .get_result(connection)?;
            u64::try_from(count).map_err(StoreError::persistence)
        })
        .await
    }

    async fn count_sender_in_window(
        &self,
        stream_id: &StreamId,
        sender_id: &SenderId,
        window: TimeWindow,
    ) -> StoreResult<u64> {
        let stream = stream_id.as_str().to_owned();
        let sender = sender_id.as_str().to_owned();
        let now = self.clock.utc();
        self.run_blocking(move |connection| {
            let count: i64 = chat_messages::table
                .filter(chat_messages::stream_id.eq(stream))
                .filter(chat_messages::sender_id.eq(sender))
                .filter(chat_messages::created_at.ge(window.from))
                .filter(chat_messages::created_at.le(window.to))
                .filter(chat_messages::expires_at.gt(now))
                .count()
                .get_result(connection)?;
            u64::try_from(count).map_err(StoreError::persistence)
        })
        .await
    }
}

fn upsert_rows(connection: &mut PgConnection, rows: &[NewChatMessageRow]) -> StoreResult<()> {
    diesel::insert_into(chat_messages::table)
        .values(rows)
        .on_conflict((
            chat_messages::stream_id,
            chat_messages::created_at,
            chat_messages::message_id,
        ))
        .do_update()
        .set((
            chat_messages::sender_id.eq(excluded(chat_messages::sender_id)),
            chat_messages::sender_display_name.eq(excluded(chat_messages::sender_display_name)),
            chat_messages::message_text.eq(excluded(chat_messages::message_text)),
            chat_messages::moderation_status.eq(excluded(chat_messages::moderation_status)),
            chat_messages::message_type.eq(excluded(chat_messages::message_type)),
            chat_messages::expires_at.eq(excluded(chat_messages::expires_at)),
        ))
        .execute(connection)?;
    Ok(())
}

fn to_new_row(message: &ChatMessage, expires_at: DateTime<Utc>) -> NewChatMessageRow {
    NewChatMessageRow {
        stream_id: message.stream_id().as_str().to_owned(),
        created_at: message.timestamp(),
        message_id: message.message_id().into_inner(),
        sender_id: message.sender_id().as_str().to_owned(),
        sender_display_name: message.sender_display_name().to_owned(),
        message_text: message.message_text().to_owned(),
        moderation_status: message.moderation_status().as_str().to_owned(),
        message_type: message.message_type().as_str().to_owned(),
        expires_at,
    }
}

fn row_to_message(row: ChatMessageRow) -> StoreResult<ChatMessage> {
    let ChatMessageRow {
        stream_id,
        created_at,
        message_id,
        sender_id,
        sender_display_name,
        message_text,
        moderation_status,
        message_type,
    } = row;

    let data = PersistedChatMessage {
        stream_id: StreamId::new(stream_id)
            .map_err(|err| StoreError::serialization(err.to_string()))?,
        timestamp: created_at,
        message_id: MessageId::from_uuid(message_id),
        sender_id: SenderId::new(sender_id)
            .map_err(|err| StoreError::serialization(err.to_string()))?,
        sender_display_name,
        message_text,
        moderation_status: ModerationStatus::try_from(moderation_status.as_str())
            .map_err(|err| StoreError::serialization(err.to_string()))?,
        message_type: MessageType::try_from(message_type.as_str())
            .map_err(|err| StoreError::serialization(err.to_string()))?,
    };
    Ok(ChatMessage::from_persisted(data))
}

fn saturating_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
