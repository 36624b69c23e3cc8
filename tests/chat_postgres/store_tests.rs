//! Port behaviour of the `PostgreSQL` chat store.

use super::helpers::{PgHarness, pg_harness, unique_stream};
use crate::test_helpers::epoch;
use chatstore::chat::domain::{
    ChatMessage, MAX_IDENTIFIER_LENGTH, MESSAGE_TTL_SECONDS, MessageId, MessageType, ModerationStatus, NewChatMessage,
    PageCursor, SenderId, StreamId,
};
use chatstore::chat::ports::{ChatMessageStore, PartitionScan, StoreError, TimeWindow, WriteTtl};
use chrono::TimeDelta;
use rstest::rstest;
use uuid::Uuid;

const TTL: WriteTtl = WriteTtl::from_secs(MESSAGE_TTL_SECONDS);

fn harness() -> Option<PgHarness> {
    pg_harness().expect("test database is reachable")
}

fn message(harness: &PgHarness, stream: &StreamId, offset_ms: i64, id: u128) -> ChatMessage {
    NewChatMessage::new(
        stream.clone(),
        SenderId::new("alice").expect("valid sender"),
        format!("message {id}"),
    )
    .with_display_name("Alice")
    .with_message_type(MessageType::Emote)
    .with_timestamp(epoch() + TimeDelta::milliseconds(offset_ms))
    .with_message_id(MessageId::from_uuid(Uuid::from_u128(id)))
    .stamp(harness.clock.as_ref())
    .expect("draft stamps")
}

fn scan(stream: &StreamId, cursor: PageCursor, limit: usize) -> PartitionScan {
    PartitionScan {
        stream_id: stream.clone(),
        cursor,
        limit,
        moderation_status: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn insert_round_trips_every_column() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    let written = message(&harness, &stream, 0, 11);

    harness.store.insert(&written, TTL).await.expect("insert");
    let read = harness
        .store
        .find_in_partition(&stream, written.message_id())
        .await
        .expect("find");

    assert_eq!(read, Some(written));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn widest_identifiers_fit_their_columns() {
    let Some(harness) = harness() else { return };
    let prefix = unique_stream();
    let padding = MAX_IDENTIFIER_LENGTH - prefix.as_str().chars().count();
    let stream = StreamId::new(format!("{prefix}{}", "é".repeat(padding))).expect("widest stream");
    let written = NewChatMessage::new(
        stream.clone(),
        SenderId::new("ü".repeat(MAX_IDENTIFIER_LENGTH)).expect("widest sender"),
        "hello",
    )
    .with_display_name("ñ".repeat(MAX_IDENTIFIER_LENGTH))
    .with_timestamp(epoch())
    .stamp(harness.clock.as_ref())
    .expect("draft stamps");

    harness.store.insert(&written, TTL).await.expect("insert");
    let read = harness
        .store
        .find_in_partition(&stream, written.message_id())
        .await
        .expect("find");

    assert_eq!(read, Some(written));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn insert_is_an_upsert() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    let written = message(&harness, &stream, 0, 12);

    harness.store.insert(&written, TTL).await.expect("first insert");
    harness
        .store
        .insert(&written.clone().with_moderation_status(ModerationStatus::Flagged), TTL)
        .await
        .expect("second insert");

    let rows = harness
        .store
        .scan_partition(&scan(&stream, PageCursor::latest(epoch()), 10))
        .await
        .expect("scan");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows.first().map(ChatMessage::moderation_status),
        Some(ModerationStatus::Flagged)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scan_honours_order_cursor_and_filter() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    let batch = vec![
        message(&harness, &stream, 0, 1),
        message(&harness, &stream, 5, 1),
        message(&harness, &stream, 5, 9).with_moderation_status(ModerationStatus::Removed),
        message(&harness, &stream, 3, 4),
    ];
    harness
        .store
        .insert_batch(&batch, TTL)
        .await
        .expect("batch");

    let all = harness
        .store
        .scan_partition(&scan(&stream, PageCursor::latest(epoch() + TimeDelta::seconds(1)), 10))
        .await
        .expect("scan");
    let order: Vec<_> = all
        .iter()
        .map(|row| row.message_id().into_inner().as_u128())
        .collect();
    assert_eq!(order, vec![9, 1, 4, 1]);

    let first = all.first().expect("rows present");
    let after = harness
        .store
        .scan_partition(&scan(&stream, PageCursor::after(first), 10))
        .await
        .expect("scan after");
    assert_eq!(after.len(), 3);

    let removed = harness
        .store
        .scan_partition(&PartitionScan {
            moderation_status: Some(ModerationStatus::Removed),
            ..scan(&stream, PageCursor::latest(epoch() + TimeDelta::seconds(1)), 10)
        })
        .await
        .expect("filtered scan");
    assert_eq!(removed.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_rows_are_invisible_and_purgeable() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    harness.clock.set(epoch() - TimeDelta::days(100));
    let written = message(&harness, &stream, 0, 21);
    harness.store.insert(&written, TTL).await.expect("insert");

    harness.clock.set(epoch() - TimeDelta::days(60));
    let count = harness.store.count_partition(&stream).await.expect("count");
    assert_eq!(count, 0);

    let removed = harness.store.purge_expired().await.expect("purge");
    assert!(removed >= 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_update_requires_live_row() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    let written = message(&harness, &stream, 0, 31);

    let missing = harness
        .store
        .update_moderation_status(&stream, written.clustering_key(), ModerationStatus::Removed)
        .await;
    assert!(matches!(missing, Err(StoreError::RowMissing { .. })));

    harness.store.insert(&written, TTL).await.expect("insert");
    harness
        .store
        .update_moderation_status(&stream, written.clustering_key(), ModerationStatus::Removed)
        .await
        .expect("update");
    let read = harness
        .store
        .find_in_partition(&stream, written.message_id())
        .await
        .expect("find");
    assert_eq!(
        read.map(|row| row.moderation_status()),
        Some(ModerationStatus::Removed)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sender_window_count_is_inclusive() {
    let Some(harness) = harness() else { return };
    let stream = unique_stream();
    let batch = vec![
        message(&harness, &stream, 0, 41),
        message(&harness, &stream, 1_000, 42),
        message(&harness, &stream, 2_000, 43),
    ];
    harness
        .store
        .insert_batch(&batch, TTL)
        .await
        .expect("batch");

    let window = TimeWindow {
        from: epoch() + TimeDelta::seconds(1),
        to: epoch() + TimeDelta::seconds(2),
    };
    let count = harness
        .store
        .count_sender_in_window(&stream, &SenderId::new("alice").expect("sender"), window)
        .await
        .expect("count");
    assert_eq!(count, 2);
}
