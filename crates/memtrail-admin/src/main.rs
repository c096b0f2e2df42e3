//! memtrail-admin - inspect and administer a history database.
//!
//! # Configuration
//!
//! - `--config <FILE>` - TOML, JSON or YAML history configuration
//! - `MEMTRAIL_HISTORY_DB_PATH` - database path, defaults to `~/.memtrail/history.db`
//! - `MEMTRAIL_BUSY_TIMEOUT_MS`, `MEMTRAIL_WAL` - connection settings
//! - `RUST_LOG` - log filter; logs go to stderr, results to stdout
//!
//! A `.env` file in the working directory is loaded first.

use anyhow::Result;
use clap::Parser;
use memtrail_core::SqliteHistoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{execute, Cli};

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to stderr (stdout carries command output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = cli.history_config()?;

    tracing::info!("History database: {}", config.db_path.display());
    let store = SqliteHistoryStore::open(&config)?;

    let mut stdout = std::io::stdout().lock();
    let result = execute(&cli.command, &store, &mut stdout);

    store.close()?;
    result
}
