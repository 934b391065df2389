//! # brewline
//!
//! Operator command line for the café: ring up sales, manage pending orders,
//! work the kitchen queue, adjust stock, and print reports.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Load settings: defaults → brewline.toml → BREWLINE__* env           │
//! │  3. Initialize tracing (RUST_LOG overrides log.level), logs to stderr   │
//! │  4. Open the configured backend, run migrations                         │
//! │  5. Run one command against Cafe<DB>                                    │
//! │  6. Close the pool                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use brewline_db::{Database, DbConfig, HostedConfig, HostedDatabase};

use crate::cli::Cli;
use crate::config::{Backend, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&settings.log.level);
    debug!(?settings, "Configuration loaded");

    let admin = settings.admin_gate();
    let storage = &settings.storage;

    match storage.backend {
        Backend::Sqlite => {
            let db = Database::new(
                DbConfig::new(&storage.sqlite_path).max_connections(storage.max_connections),
            )
            .await
            .with_context(|| format!("failed to open {}", storage.sqlite_path.display()))?;
            info!(path = %storage.sqlite_path.display(), "Using SQLite store");

            let result = commands::run(&db.cafe(admin), cli.command, cli.json).await;
            db.close().await;
            result
        }
        Backend::Postgres => {
            let url = storage
                .postgres_url
                .clone()
                .context("storage.postgres_url is not set")?;
            let config = HostedConfig::new(url).max_connections(storage.max_connections);
            let redacted = config.redacted_url();
            let db = HostedDatabase::connect(config)
                .await
                .with_context(|| format!("failed to connect to {redacted}"))?;
            info!(url = %redacted, "Using PostgreSQL store");

            let result = commands::run(&db.cafe(admin), cli.command, cli.json).await;
            db.close().await;
            result
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
