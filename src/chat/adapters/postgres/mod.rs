//! `PostgreSQL` adapter emulating the wide-column partition table.

mod models;
mod repository;
mod schema;

pub use repository::{ChatPgPool, PostgresChatMessageStore};
