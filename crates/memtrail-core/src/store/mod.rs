//! History store backends.

mod async_store;
pub mod schema;
mod sqlite;

pub use async_store::AsyncHistoryStore;
pub use sqlite::SqliteHistoryStore;
