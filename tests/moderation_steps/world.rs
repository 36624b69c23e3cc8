//! Shared world state for moderation BDD scenarios.

use std::sync::Arc;

use chatstore::chat::{
    adapters::memory::InMemoryChatMessageStore,
    domain::{ChatMessage, StreamId},
    services::{ChatMessageService, ChatStoreError},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestChatService = ChatMessageService<InMemoryChatMessageStore, DefaultClock>;

/// Scenario world for moderation behaviour tests.
pub struct ModerationWorld {
    pub service: TestChatService,
    pub stream: Option<StreamId>,
    pub message: Option<ChatMessage>,
    pub last_update_result: Option<Result<ChatMessage, ChatStoreError>>,
}

impl ModerationWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let service = ChatMessageService::new(
            Arc::new(InMemoryChatMessageStore::new()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            stream: None,
            message: None,
            last_update_result: None,
        }
    }
}

impl Default for ModerationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ModerationWorld {
    ModerationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
