//! Parallel writers appending to a single stream.

use std::sync::Arc;

use crate::test_helpers::draft;
use chatstore::chat::{
    adapters::memory::InMemoryChatMessageStore, domain::StreamId, services::ChatMessageService,
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_are_all_retained() {
    let service = Arc::new(ChatMessageService::new(
        Arc::new(InMemoryChatMessageStore::new()),
        Arc::new(DefaultClock),
    ));

    let writers: Vec<_> = (0..8)
        .map(|writer| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                for index in 0..25 {
                    service
                        .create(draft(
                            "busy",
                            &format!("writer-{writer}"),
                            &format!("message {index}"),
                        ))
                        .await
                        .expect("create");
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.expect("writer task completes");
    }

    let stream = StreamId::new("busy").expect("valid stream");
    let count = service.count_by_stream(&stream).await.expect("count");
    assert_eq!(count, 200);
}
