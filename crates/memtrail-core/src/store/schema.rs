//! Versioned schema for the history table.
//!
//! The applied version is kept in SQLite's `user_version` pragma. Each
//! migration runs in its own transaction together with the version bump.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{MemtrailError, MemtrailResult};

/// Name of the history table.
pub const HISTORY_TABLE: &str = "memory_history";

/// A single schema step.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

// Length limits here must agree with `types::limits`.
const HISTORY_TABLE_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS memory_history (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT NOT NULL UNIQUE,
    memory_id    TEXT NOT NULL CHECK (length(memory_id) <= 36),
    old_memory   TEXT,
    new_memory   TEXT,
    event        TEXT NOT NULL CHECK (length(event) <= 10),
    created_at   TEXT,
    updated_at   TEXT,
    is_deleted   INTEGER NOT NULL DEFAULT 0 CHECK (is_deleted IN (0, 1)),
    actor_id     TEXT CHECK (actor_id IS NULL OR length(actor_id) <= 36),
    role         TEXT CHECK (role IS NULL OR length(role) <= 50)
);

CREATE INDEX IF NOT EXISTS idx_memory_history_memory_id
    ON memory_history(memory_id);
"#;

const HISTORY_ORDER_INDEX_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memory_history_order
    ON memory_history(memory_id, created_at, updated_at, seq);
"#;

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "memory_history_table",
        sql: HISTORY_TABLE_V1_SQL,
    },
    Migration {
        version: 2,
        name: "memory_history_order_index",
        sql: HISTORY_ORDER_INDEX_V2_SQL,
    },
];

/// Newest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Read the schema version recorded in the database.
pub fn current_version(conn: &Connection) -> MemtrailResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Apply every migration newer than the recorded version.
///
/// Returns the resulting schema version. A database written by a newer
/// build is refused rather than guessed at.
pub fn migrate(conn: &mut Connection) -> MemtrailResult<u32> {
    let mut version = current_version(conn)?;
    let latest = latest_version();

    if version > latest {
        let err = MemtrailError::Configuration(format!(
            "history database schema version {} is newer than supported version {}",
            version, latest
        ));
        tracing::error!("{}", err);
        return Err(err);
    }

    let applied = version;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        debug!(
            version = migration.version,
            name = migration.name,
            "Applying history schema migration"
        );
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tx.commit()?;
        version = migration.version;
    }

    Ok(version)
}
