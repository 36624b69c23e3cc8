//! Application services for chat message storage.

mod error;
mod message_service;

pub use error::{ChatStoreError, ChatStoreResult, ErrorKind};
pub use message_service::ChatMessageService;
