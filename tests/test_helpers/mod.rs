//! Shared clock and fixture helpers for integration tests.

use std::sync::{Arc, Mutex, PoisonError};

use chatstore::chat::{
    adapters::memory::InMemoryChatMessageStore,
    domain::{NewChatMessage, SenderId, StreamId},
    services::ChatMessageService,
};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

/// Clock that only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += delta;
    }

    /// Moves the clock to `instant`.
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

/// In-memory store driven by a [`ManualClock`].
pub type ManualStore = InMemoryChatMessageStore<ManualClock>;

/// Service over a [`ManualStore`].
pub type ManualService = ChatMessageService<ManualStore, ManualClock>;

/// Returns 2026-03-01T12:00:00Z.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_772_366_400, 0).unwrap_or_default()
}

/// Builds a clock, store and service sharing the same frozen time.
#[must_use]
pub fn manual_service() -> (Arc<ManualClock>, Arc<ManualStore>, ManualService) {
    let clock = Arc::new(ManualClock::at(epoch()));
    let store = Arc::new(InMemoryChatMessageStore::with_clock(Arc::clone(&clock)));
    let service = ChatMessageService::new(Arc::clone(&store), Arc::clone(&clock));
    (clock, store, service)
}

/// Builds a draft from raw identifiers.
///
/// # Panics
///
/// Panics when either identifier is blank.
#[must_use]
pub fn draft(stream_id: &str, sender_id: &str, text: &str) -> NewChatMessage {
    let stream = StreamId::new(stream_id).expect("valid stream id");
    let sender = SenderId::new(sender_id).expect("valid sender id");
    NewChatMessage::new(stream, sender, text)
}
