//! Adapter implementations of the chat storage port.

pub mod memory;
pub mod postgres;
