//! Command definitions and execution.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use memtrail_core::types::parse_timestamp;
use memtrail_core::{
    HistoryConfig, HistoryQuery, HistorySink, LegacyHistoryAdapter, SqliteHistoryStore,
};

#[derive(Parser, Debug)]
#[command(name = "memtrail-admin")]
#[command(about = "Inspect and administer a memtrail history database")]
#[command(version)]
pub struct Cli {
    /// Configuration file (.toml, .json or .yaml). Environment variables are used otherwise.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// History database path, overriding the configuration.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the ordered history of one memory.
    History {
        memory_id: String,

        /// Emit entries with the older action/prev_value/new_value field names.
        #[arg(long)]
        legacy: bool,
    },

    /// List events across all memories.
    List {
        /// Only this event (ADD, UPDATE, DELETE, ...).
        #[arg(long)]
        event: Option<String>,

        /// Only rows with this soft-delete flag.
        #[arg(long)]
        deleted: Option<bool>,

        /// Case-insensitive text to look for in memory IDs and values.
        #[arg(long)]
        search: Option<String>,

        /// Only rows created at or after this time (RFC 3339).
        #[arg(long, value_parser = parse_timestamp)]
        since: Option<DateTime<Utc>>,

        /// Only rows created at or before this time (RFC 3339).
        #[arg(long, value_parser = parse_timestamp)]
        until: Option<DateTime<Utc>>,

        /// Maximum number of rows.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the total number of stored events.
    Count,

    /// Delete every stored event.
    Reset {
        /// Confirm the irreversible deletion.
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Resolve the store configuration from flags, file and environment.
    pub fn history_config(&self) -> Result<HistoryConfig> {
        let mut config = match &self.config {
            Some(path) => HistoryConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => HistoryConfig::from_env()?,
        };
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Execute `command` against `store`, writing results to `out`.
pub fn execute(command: &Command, store: &SqliteHistoryStore, out: &mut impl Write) -> Result<()> {
    match command {
        Command::History { memory_id, legacy } => {
            if *legacy {
                let entries = LegacyHistoryAdapter::new(store).get_history(memory_id)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else {
                let entries = store.get_history(memory_id)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            }
        }
        Command::List {
            event,
            deleted,
            search,
            since,
            until,
            limit,
        } => {
            let query = HistoryQuery {
                event: event.clone(),
                is_deleted: *deleted,
                search: search.clone(),
                created_after: *since,
                created_before: *until,
                limit: *limit,
            };
            let entries = store.list(&query)?;
            tracing::debug!(rows = entries.len(), "Listed history");
            writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        }
        Command::Count => {
            writeln!(out, "{}", store.count()?)?;
        }
        Command::Reset { yes } => {
            if !*yes {
                bail!("refusing to reset history without --yes");
            }
            let before = store.count()?;
            store.reset()?;
            writeln!(out, "removed {} events", before)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memtrail_core::AppendOptions;

    fn seeded_store() -> SqliteHistoryStore {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store
            .append_event("m1", None, Some("fact A"), "ADD", &AppendOptions::default())
            .unwrap();
        store
            .append_event(
                "m1",
                Some("fact A"),
                None,
                "DELETE",
                &AppendOptions::new().with_is_deleted(true),
            )
            .unwrap();
        store
    }

    fn run(args: &[&str], store: &SqliteHistoryStore) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        execute(&cli.command, store, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_history_command() {
        let store = seeded_store();
        let output = run(&["memtrail-admin", "history", "m1"], &store).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["event"], "ADD");
        assert!(json[0]["old_memory"].is_null());
    }

    #[test]
    fn test_history_command_legacy() {
        let store = seeded_store();
        let output = run(&["memtrail-admin", "history", "m1", "--legacy"], &store).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["action"], "ADD");
        assert!(json[0].get("prev_value").is_none());
        assert_eq!(json[1]["is_deleted"], 1);
    }

    #[test]
    fn test_list_command_filters() {
        let store = seeded_store();
        let output = run(
            &["memtrail-admin", "list", "--deleted", "true", "--search", "fact"],
            &store,
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["event"], "DELETE");
    }

    #[test]
    fn test_list_rejects_bad_timestamp() {
        assert!(Cli::try_parse_from(["memtrail-admin", "list", "--since", "last week"]).is_err());
    }

    #[test]
    fn test_count_and_reset() {
        let store = seeded_store();
        assert_eq!(run(&["memtrail-admin", "count"], &store).unwrap().trim(), "2");

        assert!(run(&["memtrail-admin", "reset"], &store).is_err());
        assert_eq!(store.count().unwrap(), 2);

        let output = run(&["memtrail-admin", "reset", "--yes"], &store).unwrap();
        assert_eq!(output.trim(), "removed 2 events");
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_db_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("memtrail.toml");
        std::fs::write(&config_path, "db_path = \"/srv/memtrail/history.db\"\nwal = false\n")
            .unwrap();
        let db_path = dir.path().join("override.db");

        let cli = Cli::try_parse_from([
            "memtrail-admin",
            "--config",
            config_path.to_str().unwrap(),
            "--db",
            db_path.to_str().unwrap(),
            "count",
        ])
        .unwrap();

        let config = cli.history_config().unwrap();
        assert_eq!(config.db_path, db_path);
        assert!(!config.wal);
    }
}
