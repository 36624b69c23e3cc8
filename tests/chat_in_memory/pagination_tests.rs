//! Cursor pagination over the public service API.

use std::collections::HashSet;

use crate::test_helpers::{draft, epoch, manual_service};
use chatstore::chat::domain::{ChatMessage, MessageId, NewChatMessage, PageCursor, StreamId};
use chrono::TimeDelta;
use rstest::rstest;

fn seeded_drafts(count: i64, burst: usize) -> Vec<NewChatMessage> {
    (0..count)
        .flat_map(|offset| {
            (0..burst).map(move |slot| {
                draft("stream-1", "alice", &format!("{offset}/{slot}"))
                    .with_timestamp(epoch() - TimeDelta::milliseconds(offset))
            })
        })
        .collect()
}

fn ids(messages: &[ChatMessage]) -> HashSet<MessageId> {
    messages.iter().map(ChatMessage::message_id).collect()
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(50)]
#[tokio::test]
async fn composite_cursor_walk_visits_every_message_once(#[case] page_size: u32) {
    let (_clock, _store, service) = manual_service();
    let seeded = service
        .batch_create(seeded_drafts(40, 3))
        .await
        .expect("seed stream");
    let stream = StreamId::new("stream-1").expect("valid stream");

    let mut visited = Vec::new();
    let mut cursor = None;
    loop {
        let page = service
            .list_by_stream(&stream, Some(page_size), cursor)
            .await
            .expect("page loads");
        let Some(last) = page.last() else { break };
        cursor = Some(PageCursor::after(last));
        visited.extend(page);
    }

    assert_eq!(visited.len(), seeded.len());
    assert_eq!(ids(&visited), ids(&seeded));
    assert!(
        visited
            .windows(2)
            .all(|pair| matches!(pair, [newer, older] if newer.clustering_key() > older.clustering_key()))
    );
}

#[rstest]
#[tokio::test]
async fn timestamp_cursor_skips_rest_of_boundary_millisecond() {
    let (_clock, _store, service) = manual_service();
    service
        .batch_create(seeded_drafts(2, 3))
        .await
        .expect("seed stream");
    let stream = StreamId::new("stream-1").expect("valid stream");

    let first = service
        .list_by_stream(&stream, Some(2), None)
        .await
        .expect("first page");
    let last = first.last().expect("first page has rows");
    let second = service
        .list_by_stream(&stream, Some(10), Some(PageCursor::before(last.timestamp())))
        .await
        .expect("second page");

    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|message| message.timestamp() < last.timestamp()));
}
