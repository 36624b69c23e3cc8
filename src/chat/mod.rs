//! Chat message storage: append-heavy, per-stream message history.
//!
//! Messages live in partitions keyed by stream, ordered newest first by
//! `(timestamp, message_id)`, and expire thirty days after they are written.
//! The service layer adds pagination, soft-delete moderation, and a derived
//! per-sender rate limiter on top of the storage port.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
