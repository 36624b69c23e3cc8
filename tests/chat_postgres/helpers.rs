//! Shared helpers for `PostgreSQL` chat store tests.

use std::sync::{Arc, OnceLock};

use crate::test_helpers::{ManualClock, epoch};
use chatstore::chat::adapters::postgres::{ChatPgPool, PostgresChatMessageStore};
use chatstore::chat::domain::StreamId;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

/// Environment variable naming the test database.
pub const DATABASE_URL_ENV: &str = "CHATSTORE_TEST_DATABASE_URL";

/// SQL creating the chat message table.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_chat_messages/up.sql");

/// Boxed error type for test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

static SCHEMA_APPLIED: OnceLock<Result<(), String>> = OnceLock::new();

/// Store under test together with the clock driving its expiry.
pub struct PgHarness {
    pub clock: Arc<ManualClock>,
    pub store: PostgresChatMessageStore<ManualClock>,
}

/// Connects to the test database and applies the schema.
///
/// Returns `Ok(None)` when no test database is configured.
///
/// # Errors
///
/// Returns an error when the pool cannot be built or the schema fails to
/// apply.
pub fn pg_harness() -> Result<Option<PgHarness>, BoxError> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        return Ok(None);
    };
    let pool: ChatPgPool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    SCHEMA_APPLIED
        .get_or_init(|| apply_schema(&pool).map_err(|err| err.to_string()))
        .clone()?;

    let clock = Arc::new(ManualClock::at(epoch()));
    let store = PostgresChatMessageStore::with_clock(pool, Arc::clone(&clock));
    Ok(Some(PgHarness { clock, store }))
}

fn apply_schema(pool: &ChatPgPool) -> Result<(), BoxError> {
    pool.get()?.batch_execute(CREATE_SCHEMA_SQL)?;
    Ok(())
}

/// Returns a stream identifier no other test run uses.
///
/// # Panics
///
/// Never in practice; the generated identifier is not blank.
#[must_use]
pub fn unique_stream() -> StreamId {
    StreamId::new(format!("pg-{}", uuid::Uuid::new_v4())).expect("valid stream id")
}
