//! memtrail-core - Core library for memtrail.
//!
//! This crate provides the audit trail a memory manager keeps for its
//! memories: every add, update and delete is appended as an immutable event
//! to a relational table and can be read back per memory, in order.
//!
//! # Example
//!
//! ```no_run
//! use memtrail_core::{AppendOptions, HistorySink, SqliteHistoryStore};
//!
//! # fn main() -> memtrail_core::MemtrailResult<()> {
//! let store = SqliteHistoryStore::new("/var/lib/memtrail/history.db")?;
//!
//! store.append_event("m1", None, Some("fact A"), "ADD", &AppendOptions::default())?;
//! store.append_event(
//!     "m1",
//!     Some("fact A"),
//!     Some("fact A revised"),
//!     "UPDATE",
//!     &AppendOptions::new().with_actor_id("u1").with_role("admin"),
//! )?;
//!
//! let history = store.get_history("m1")?;
//! assert_eq!(history.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod compat;
pub mod config;
pub mod error;
pub mod recorder;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use compat::{LegacyHistoryAdapter, LegacyHistoryEntry};
pub use config::HistoryConfig;
pub use error::{ErrorCode, MemtrailError, MemtrailResult};
pub use recorder::HistoryRecorder;
pub use store::{AsyncHistoryStore, SqliteHistoryStore};
pub use traits::{AsyncHistorySink, HistorySink};
pub use types::{AppendOptions, EventKind, HistoryQuery, HistoryRecord};
