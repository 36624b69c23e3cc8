//! Chatstore: storage engine for real-time chat messages.
//!
//! The crate persists chat messages into per-stream partitions with a fixed
//! retention, reads them back with cursor pagination, applies moderation
//! updates, and answers per-sender rate-limit queries.
//!
//! # Architecture
//!
//! Chatstore follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//! - **Services**: Orchestration of domain rules over the ports
//!
//! # Modules
//!
//! - [`chat`]: Message model, storage port, adapters and service
//! - [`config`]: Environment-driven runtime configuration
//! - [`telemetry`]: Tracing subscriber initialisation

pub mod chat;
pub mod config;
pub mod telemetry;
