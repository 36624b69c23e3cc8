//! Shared fixtures for chat unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use crate::chat::{
    adapters::memory::InMemoryChatMessageStore,
    domain::{NewChatMessage, SenderId, StreamId},
    services::ChatMessageService,
};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub type TestStore = InMemoryChatMessageStore<ManualClock>;
pub type TestService = ChatMessageService<TestStore, ManualClock>;

/// 2026-03-01T12:00:00Z, millisecond aligned.
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_772_366_400, 0).expect("valid epoch")
}

pub fn stream(value: &str) -> StreamId {
    StreamId::new(value).expect("valid stream id")
}

pub fn sender(value: &str) -> SenderId {
    SenderId::new(value).expect("valid sender id")
}

pub fn draft(stream_id: &str, sender_id: &str, text: &str) -> NewChatMessage {
    NewChatMessage::new(stream(stream_id), sender(sender_id), text)
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<TestStore>,
    pub service: TestService,
}

#[fixture]
pub fn harness() -> Harness {
    let clock = Arc::new(ManualClock::at(epoch()));
    let store = Arc::new(InMemoryChatMessageStore::with_clock(Arc::clone(&clock)));
    let service = ChatMessageService::new(Arc::clone(&store), Arc::clone(&clock));
    Harness {
        clock,
        store,
        service,
    }
}
