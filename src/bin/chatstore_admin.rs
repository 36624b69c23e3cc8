//! Administrative entry point for the chat message table.
//!
//! Usage:
//!
//! ```text
//! chatstore-admin <operation>
//! ```
//!
//! The `operation` must be `migrate` or `purge-expired`. Connection settings
//! come from `CHATSTORE__DATABASE__URL` and `CHATSTORE__DATABASE__POOL_SIZE`;
//! log output follows `CHATSTORE__LOGGING__LEVEL` and
//! `CHATSTORE__LOGGING__FORMAT`.
//!
//! `migrate` applies the bundled schema, which is idempotent. `purge-expired`
//! deletes every row whose TTL has elapsed.

use chatstore::chat::adapters::postgres::{ChatPgPool, PostgresChatMessageStore};
use chatstore::config::{ChatStoreConfig, ConfigError, DatabaseConfig};
use chatstore::telemetry::{TelemetryError, init_tracing};
use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::info;

const CREATE_CHAT_MESSAGES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_chat_messages/up.sql");

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum AdminError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("database URL is not configured; set CHATSTORE__DATABASE__URL")]
    MissingDatabaseUrl,
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error("failed to check out connection: {0}")]
    Checkout(#[source] diesel::r2d2::PoolError),
    #[error("migration failed: {0}")]
    Migration(#[source] diesel::result::Error),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("purge failed: {0}")]
    Purge(#[source] chatstore::chat::ports::StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Migrate,
    PurgeExpired,
}

impl Operation {
    fn parse(arg: &str) -> Result<Self, AdminError> {
        match arg {
            "migrate" => Ok(Self::Migrate),
            "purge-expired" => Ok(Self::PurgeExpired),
            other => Err(AdminError::InvalidArgs(format!(
                "unknown operation '{other}'; expected migrate or purge-expired"
            ))),
        }
    }
}

fn main() -> Result<(), BoxError> {
    let operation = parse_args(std::env::args())?;
    let config = ChatStoreConfig::load().map_err(AdminError::from)?;
    init_tracing(&config.logging).map_err(AdminError::from)?;
    run(operation, &config.database).map_err(Into::into)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Operation, AdminError> {
    let _program = args.next();
    let operation = args
        .next()
        .ok_or_else(|| AdminError::InvalidArgs("missing operation argument".into()))
        .and_then(|arg| Operation::parse(&arg))?;
    if let Some(extra) = args.next() {
        return Err(AdminError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(operation)
}

fn run(operation: Operation, database: &DatabaseConfig) -> Result<(), AdminError> {
    let pool = build_pool(database)?;
    match operation {
        Operation::Migrate => migrate(&pool),
        Operation::PurgeExpired => purge_expired(pool),
    }
}

fn build_pool(database: &DatabaseConfig) -> Result<ChatPgPool, AdminError> {
    let url = database
        .url
        .as_deref()
        .ok_or(AdminError::MissingDatabaseUrl)?;
    Pool::builder()
        .max_size(database.pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))
        .map_err(AdminError::Pool)
}

fn migrate(pool: &ChatPgPool) -> Result<(), AdminError> {
    let mut connection = pool.get().map_err(AdminError::Checkout)?;
    connection
        .batch_execute(CREATE_CHAT_MESSAGES_SQL)
        .map_err(AdminError::Migration)?;
    info!("chat_messages schema applied");
    Ok(())
}

fn purge_expired(pool: ChatPgPool) -> Result<(), AdminError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AdminError::RuntimeInit)?;
    let store = PostgresChatMessageStore::new(pool);
    let removed = runtime
        .block_on(store.purge_expired())
        .map_err(AdminError::Purge)?;
    info!(removed, "expired chat messages purged");
    Ok(())
}
