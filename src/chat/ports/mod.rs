//! Port trait definitions for the chat storage engine.
//!
//! Adapters implement these ports to connect the service layer to a concrete
//! store.

pub mod store;

pub use store::{
    ChatMessageStore, PartitionScan, StoreError, StoreResult, TimeWindow, WriteTtl,
};
