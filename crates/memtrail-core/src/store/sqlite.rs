//! History tracking using SQLite.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HistoryConfig;
use crate::error::{MemtrailError, MemtrailResult};
use crate::store::schema;
use crate::traits::HistorySink;
use crate::types::{format_timestamp, parse_timestamp, AppendOptions, HistoryQuery, HistoryRecord};

const SELECT_COLUMNS: &str = r#"
    SELECT id, memory_id, old_memory, new_memory, event,
           created_at, updated_at, is_deleted, actor_id, role
    FROM memory_history
"#;

// `seq` breaks ties between rows with identical timestamps.
const ORDER_BY: &str = "ORDER BY created_at ASC, updated_at ASC, seq ASC";

/// SQLite-backed history store.
///
/// Holds one connection behind a mutex. Several processes may open the same
/// file; SQLite's locking and the configured busy timeout serialize writers.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open a store at `db_path` with default settings.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn new(db_path: impl AsRef<Path>) -> MemtrailResult<Self> {
        let config = HistoryConfig {
            db_path: db_path.as_ref().to_path_buf(),
            ..HistoryConfig::default()
        };
        Self::open(&config)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> MemtrailResult<Self> {
        Self::open(&HistoryConfig::in_memory())
    }

    /// Open a store as described by `config`, creating the file and schema if needed.
    pub fn open(config: &HistoryConfig) -> MemtrailResult<Self> {
        config.validate()?;

        let mut conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = config.db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(&config.db_path)?
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        if config.wal && !config.is_in_memory() {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get(0)
            })?;
            debug!(journal_mode = %mode, "History journal mode set");
        }

        let version = schema::migrate(&mut conn)?;
        debug!(
            path = %config.db_path.display(),
            schema_version = version,
            "History store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the underlying connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> MemtrailResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|e| MemtrailError::internal(format!("history connection lock poisoned: {}", e)))?;
        conn.close().map_err(|(_, e)| MemtrailError::from(e))?;
        debug!("History store closed");
        Ok(())
    }

    fn lock(&self) -> MemtrailResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MemtrailError::internal(format!("history connection lock poisoned: {}", e)))
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> MemtrailResult<u32> {
        let conn = self.lock()?;
        schema::current_version(&conn)
    }

    /// Total number of stored events across all memories.
    pub fn count(&self) -> MemtrailResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memory_history", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    /// List events across all memories matching `query`, in history order.
    ///
    /// `search` is matched in Rust on Unicode-lowercased text, since SQLite's
    /// `LIKE` only folds ASCII case. The limit then applies to matching rows.
    pub fn list(&self, query: &HistoryQuery) -> MemtrailResult<Vec<HistoryRecord>> {
        let limit = query
            .limit
            .map(|limit| {
                i64::try_from(limit).map_err(|_| {
                    MemtrailError::validation(format!("limit {} is too large", limit))
                })
            })
            .transpose()?;
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(event) = &query.event {
            clauses.push("event = ?");
            args.push(Value::Text(event.clone()));
        }
        if let Some(is_deleted) = query.is_deleted {
            clauses.push("is_deleted = ?");
            args.push(Value::Integer(i64::from(is_deleted)));
        }
        if let Some(after) = &query.created_after {
            clauses.push("created_at >= ?");
            args.push(Value::Text(format_timestamp(after)));
        }
        if let Some(before) = &query.created_before {
            clauses.push("created_at <= ?");
            args.push(Value::Text(format_timestamp(before)));
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(ORDER_BY);
        if let (Some(limit), None) = (limit, &needle) {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(limit));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| Ok(Self::row_to_record(row)))?;

        let mut records = Vec::new();
        for row in rows {
            if limit.is_some_and(|limit| records.len() as i64 >= limit) {
                break;
            }
            let record = row??;
            if needle
                .as_deref()
                .map_or(true, |needle| matches_search(&record, needle))
            {
                records.push(record);
            }
        }

        Ok(records)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> MemtrailResult<HistoryRecord> {
        let created_at: Option<String> = row.get(5)?;
        let updated_at: Option<String> = row.get(6)?;

        Ok(HistoryRecord {
            id: row.get(0)?,
            memory_id: row.get(1)?,
            old_memory: row.get(2)?,
            new_memory: row.get(3)?,
            event: row.get(4)?,
            created_at: created_at.as_deref().map(parse_timestamp).transpose()?,
            updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
            is_deleted: row.get(7)?,
            actor_id: row.get(8)?,
            role: row.get(9)?,
        })
    }
}

impl HistorySink for SqliteHistoryStore {
    fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO memory_history (
                id, memory_id, old_memory, new_memory, event,
                created_at, updated_at, is_deleted, actor_id, role
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                memory_id,
                old_value,
                new_value,
                event,
                options.created_at.as_ref().map(format_timestamp),
                options.updated_at.as_ref().map(format_timestamp),
                options.is_deleted,
                options.actor_id,
                options.role,
            ],
        )?;

        info!(memory_id, event, "Added history for memory");
        Ok(())
    }

    fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE memory_id = ?1 {}", SELECT_COLUMNS, ORDER_BY);
        let mut stmt = conn.prepare_cached(&sql)?;

        let records = stmt
            .query_map([memory_id], |row| Ok(Self::row_to_record(row)))?
            .map(|r| r.map_err(MemtrailError::from).and_then(|inner| inner))
            .collect::<MemtrailResult<Vec<_>>>()?;

        Ok(records)
    }

    fn reset(&self) -> MemtrailResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM memory_history", [])?;
        warn!(removed, "Reset all memory history");
        Ok(())
    }
}

// `needle` is already lowercased.
fn matches_search(record: &HistoryRecord, needle: &str) -> bool {
    [
        Some(record.memory_id.as_str()),
        record.old_memory.as_deref(),
        record.new_memory.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(needle))
}
