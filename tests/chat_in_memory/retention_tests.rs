//! Retention behaviour observed through the service.

use crate::test_helpers::{draft, manual_service};
use chatstore::chat::{domain::StreamId, services::ErrorKind};
use chrono::TimeDelta;
use rstest::rstest;

#[rstest]
#[case(TimeDelta::days(29), true)]
#[case(TimeDelta::days(30) - TimeDelta::milliseconds(1), true)]
#[case(TimeDelta::days(30), false)]
#[case(TimeDelta::days(31), false)]
#[tokio::test]
async fn message_visibility_follows_ttl(#[case] elapsed: TimeDelta, #[case] visible: bool) {
    let (clock, _store, service) = manual_service();
    let created = service
        .create(draft("stream-1", "alice", "ephemeral"))
        .await
        .expect("create");
    let stream = StreamId::new("stream-1").expect("valid stream");

    clock.advance(elapsed);

    let lookup = service.get_by_id(&stream, created.message_id()).await;
    let listed = service
        .list_by_stream(&stream, None, None)
        .await
        .expect("list");
    let count = service.count_by_stream(&stream).await.expect("count");

    assert_eq!(lookup.is_ok(), visible);
    if !visible {
        assert_eq!(
            lookup.map_err(|err| err.kind()).err(),
            Some(ErrorKind::NotFound)
        );
    }
    assert_eq!(listed.len(), usize::from(visible));
    assert_eq!(count, u64::from(visible));
}

#[rstest]
#[tokio::test]
async fn moderation_does_not_extend_retention() {
    let (clock, _store, service) = manual_service();
    let created = service
        .create(draft("stream-1", "alice", "flag me later"))
        .await
        .expect("create");
    let stream = StreamId::new("stream-1").expect("valid stream");

    clock.advance(TimeDelta::days(20));
    service
        .delete(&stream, created.message_id())
        .await
        .expect("soft delete");

    clock.advance(TimeDelta::days(11));
    let count = service.count_by_stream(&stream).await.expect("count");
    assert_eq!(count, 0);
}
